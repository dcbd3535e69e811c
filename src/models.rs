//! Domain types for companies and residency listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Company identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub Uuid);

impl CompanyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Residency (job posting) identity, internal to this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidencyId(pub Uuid);

impl ResidencyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResidencyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResidencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Residency program type.
///
/// The codes match the labels of the source endpoints; `R1+R2` is a
/// combined program listed on its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResidencyType {
    #[serde(rename = "R1")]
    R1,
    #[serde(rename = "R1+R2")]
    R1R2,
    #[serde(rename = "R2")]
    R2,
    #[serde(rename = "R3")]
    R3,
    #[serde(rename = "R4")]
    R4,
}

impl ResidencyType {
    pub const ALL: [ResidencyType; 5] = [
        ResidencyType::R1,
        ResidencyType::R1R2,
        ResidencyType::R2,
        ResidencyType::R3,
        ResidencyType::R4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResidencyType::R1 => "R1",
            ResidencyType::R1R2 => "R1+R2",
            ResidencyType::R2 => "R2",
            ResidencyType::R3 => "R3",
            ResidencyType::R4 => "R4",
        }
    }
}

impl fmt::Display for ResidencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown residency type '{0}'")]
pub struct UnknownResidencyType(pub String);

impl FromStr for ResidencyType {
    type Err = UnknownResidencyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResidencyType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownResidencyType(s.to_string()))
    }
}

/// A company in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// Canonical slug, `slugify(name)` at creation time
    pub slug: String,
    /// Logo reference in blob storage
    pub image_id: Option<String>,
    pub website: Option<String>,
    /// Slugs of companies merged into this one (never contains `slug`)
    pub aliases: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            slug: slug.into(),
            image_id: None,
            website: None,
            aliases: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn has_alias(&self, slug: &str) -> bool {
        self.aliases.iter().any(|a| a == slug)
    }
}

/// Normalized listing fields as produced by the record normalizer.
///
/// These are exactly the fields a sync writes; `location` and the
/// internal identity are owned by this system and never overwritten by a
/// sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencyFields {
    pub external_id: String,
    /// Raw composite name, e.g. `"R2 | Acme Corp 03"`
    pub name: String,
    pub residency_type: ResidencyType,
    pub residency_title: String,
    pub job_title: String,
    pub description: Option<String>,
    pub email_address: Option<String>,
    pub monthly_salary: Option<String>,
    pub accommodation_support: Option<String>,
    /// Creation time as delivered by the source
    pub created_at: String,
}

/// A stored residency listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residency {
    pub id: ResidencyId,
    pub external_id: String,
    pub name: String,
    pub residency_type: ResidencyType,
    pub residency_title: String,
    pub job_title: String,
    pub description: Option<String>,
    pub email_address: Option<String>,
    pub monthly_salary: Option<String>,
    pub accommodation_support: Option<String>,
    pub location: Option<String>,
    pub company_id: Option<CompanyId>,
    pub created_at: String,
    pub synced_at: DateTime<Utc>,
}

impl Residency {
    pub fn from_fields(
        id: ResidencyId,
        fields: ResidencyFields,
        company_id: Option<CompanyId>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            external_id: fields.external_id,
            name: fields.name,
            residency_type: fields.residency_type,
            residency_title: fields.residency_title,
            job_title: fields.job_title,
            description: fields.description,
            email_address: fields.email_address,
            monthly_salary: fields.monthly_salary,
            accommodation_support: fields.accommodation_support,
            location: None,
            company_id,
            created_at: fields.created_at,
            synced_at,
        }
    }

    /// Overwrite every synced field, keeping identity and `location`.
    pub fn apply_fields(
        &mut self,
        fields: ResidencyFields,
        company_id: Option<CompanyId>,
        synced_at: DateTime<Utc>,
    ) {
        self.external_id = fields.external_id;
        self.name = fields.name;
        self.residency_type = fields.residency_type;
        self.residency_title = fields.residency_title;
        self.job_title = fields.job_title;
        self.description = fields.description;
        self.email_address = fields.email_address;
        self.monthly_salary = fields.monthly_salary;
        self.accommodation_support = fields.accommodation_support;
        self.created_at = fields.created_at;
        self.company_id = company_id;
        self.synced_at = synced_at;
    }

    pub fn fields(&self) -> ResidencyFields {
        ResidencyFields {
            external_id: self.external_id.clone(),
            name: self.name.clone(),
            residency_type: self.residency_type,
            residency_title: self.residency_title.clone(),
            job_title: self.job_title.clone(),
            description: self.description.clone(),
            email_address: self.email_address.clone(),
            monthly_salary: self.monthly_salary.clone(),
            accommodation_support: self.accommodation_support.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Residency joined with its (live) company, as served to the browsing UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidencyWithCompany {
    #[serde(flatten)]
    pub residency: Residency,
    pub company: Option<Company>,
}

impl ResidencyWithCompany {
    /// Name used for ordering listings: the company's, else the raw name
    pub fn sort_name(&self) -> &str {
        self.company
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(self.residency.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residency_type_round_trip_labels() {
        for t in ResidencyType::ALL {
            assert_eq!(t.as_str().parse::<ResidencyType>().unwrap(), t);
        }
        assert_eq!("r1+r2".parse::<ResidencyType>().unwrap(), ResidencyType::R1R2);
        assert!("R5".parse::<ResidencyType>().is_err());
    }

    #[test]
    fn test_residency_type_serializes_as_label() {
        let json = serde_json::to_string(&ResidencyType::R1R2).unwrap();
        assert_eq!(json, "\"R1+R2\"");
    }

    #[test]
    fn test_apply_fields_keeps_location_and_identity() {
        let fields = ResidencyFields {
            external_id: "rec1".into(),
            name: "R1 | Acme".into(),
            residency_type: ResidencyType::R1,
            residency_title: "Title".into(),
            job_title: "Engineer".into(),
            description: None,
            email_address: None,
            monthly_salary: None,
            accommodation_support: None,
            created_at: "2024-01-01T00:00:00.000Z".into(),
        };
        let id = ResidencyId::new();
        let mut residency = Residency::from_fields(id, fields.clone(), None, Utc::now());
        residency.location = Some("London".into());

        let mut changed = fields;
        changed.job_title = "Designer".into();
        residency.apply_fields(changed, None, Utc::now());

        assert_eq!(residency.id, id);
        assert_eq!(residency.job_title, "Designer");
        assert_eq!(residency.location.as_deref(), Some("London"));
    }
}
