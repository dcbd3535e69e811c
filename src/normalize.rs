//! Record normalization and company-name handling
//!
//! - Company display name extraction from the composite `Name` field
//! - Slug derivation (Unicode NFKD fold, diacritics dropped, ASCII only)
//! - Mapping of a raw source record onto [`ResidencyFields`]

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::{ResidencyFields, ResidencyType};
use crate::source::types::{
    SourceRecord, FIELD_ACCOMMODATION, FIELD_EMAIL, FIELD_JOB_DESCRIPTION, FIELD_JOB_TITLE,
    FIELD_MONTHLY_SALARY, FIELD_NAME, FIELD_RESIDENCY_TITLE,
};

/// Trailing counter on a company segment, e.g. `"Acme Corp 03"` or `"Acme_2"`
static TRAILING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]*\d+$").unwrap());

/// Letters NFKD leaves alone that still have an obvious ASCII spelling
const TRANSLITERATIONS: &[(char, &str)] = &[
    ('ß', "ss"),
    ('æ', "ae"),
    ('Æ', "ae"),
    ('ø', "o"),
    ('Ø', "o"),
    ('œ', "oe"),
    ('Œ', "oe"),
    ('ł', "l"),
    ('Ł', "l"),
    ('đ', "d"),
    ('Đ', "d"),
    ('þ', "th"),
    ('Þ', "th"),
];

/// Extract the company display name from a composite listing name.
///
/// The name is pipe-delimited (`"R2 | Acme Corp 03"`). The second segment,
/// trimmed and with a trailing counter stripped, is the company name. A
/// name without a pipe is returned unchanged.
///
/// # Examples
///
/// ```
/// use residency_sync::normalize::extract_company_name;
///
/// assert_eq!(extract_company_name("R2 | Acme Corp 03"), "Acme Corp");
/// assert_eq!(extract_company_name("Solo Name"), "Solo Name");
/// ```
pub fn extract_company_name(name: &str) -> String {
    let mut segments = name.split('|');
    let _program = segments.next();

    match segments.next() {
        Some(company) => TRAILING_NUMBER_RE
            .replace(company.trim(), "")
            .trim()
            .to_string(),
        None => name.to_string(),
    }
}

/// Derive the canonical company slug.
///
/// Lowercase ASCII alphanumerics separated by single hyphens. Accented
/// letters lose their diacritics (`Über` -> `uber`); characters with no
/// ASCII form act as separators. The result is empty when nothing
/// alphanumeric survives.
///
/// # Examples
///
/// ```
/// use residency_sync::normalize::slugify;
///
/// assert_eq!(slugify("Acme Corp!! 2024"), "acme-corp-2024");
/// assert_eq!(slugify("  Über_Tech  "), "uber-tech");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut separator_pending = false;

    let folded = name.nfkd().filter(|c| !is_combining_mark(*c));

    for c in folded {
        let spelled = match TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => to.to_string(),
            None => c.to_lowercase().collect(),
        };

        for c in spelled.chars() {
            if c.is_ascii_alphanumeric() {
                if separator_pending && !slug.is_empty() {
                    slug.push('-');
                }
                separator_pending = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                separator_pending = true;
            }
        }
    }

    slug
}

/// Map a raw source record onto the canonical residency shape.
///
/// Missing required text fields become empty strings, missing optional
/// fields become `None`.
pub fn normalize_record(record: &SourceRecord, residency_type: ResidencyType) -> ResidencyFields {
    let fields = &record.fields;

    ResidencyFields {
        external_id: record.id.clone(),
        name: fields.text(FIELD_NAME).unwrap_or_default(),
        residency_type,
        residency_title: fields.text(FIELD_RESIDENCY_TITLE).unwrap_or_default(),
        job_title: fields.text(FIELD_JOB_TITLE).unwrap_or_default(),
        description: fields.text(FIELD_JOB_DESCRIPTION),
        email_address: fields.text(FIELD_EMAIL),
        monthly_salary: fields.text(FIELD_MONTHLY_SALARY),
        accommodation_support: fields.text(FIELD_ACCOMMODATION),
        created_at: record.created_time.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::types::RecordFields;
    use serde_json::json;

    #[test]
    fn test_extract_company_name() {
        assert_eq!(extract_company_name("R2 | Acme Corp 03"), "Acme Corp");
        assert_eq!(extract_company_name("R1 | Acme Corp"), "Acme Corp");
        assert_eq!(extract_company_name("R1|Acme_2"), "Acme");
        assert_eq!(extract_company_name("R3 | Studio - 12"), "Studio");
        assert_eq!(extract_company_name("Solo Name"), "Solo Name");
        assert_eq!(extract_company_name("Solo Name 2"), "Solo Name 2");
    }

    #[test]
    fn test_extract_company_name_uses_second_segment_only() {
        assert_eq!(extract_company_name("R4 | Beta Labs | Paris"), "Beta Labs");
        assert_eq!(extract_company_name("R4 | "), "");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Corp!! 2024"), "acme-corp-2024");
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("--Acme--"), "acme");
        assert_eq!(slugify("AT&T"), "at-t");
    }

    #[test]
    fn test_slugify_non_ascii() {
        assert_eq!(slugify("  Über_Tech  "), "uber-tech");
        assert_eq!(slugify("Société Générale"), "societe-generale");
        assert_eq!(slugify("Straße"), "strasse");
        assert_eq!(slugify("Ａｃｍｅ"), "acme");
        assert_eq!(slugify("株式会社"), "");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_normalize_record() {
        let mut fields = RecordFields::default();
        fields.insert(FIELD_NAME, "R2 | Acme Corp 03");
        fields.insert(FIELD_JOB_TITLE, "Engineer");
        fields.insert(FIELD_MONTHLY_SALARY, json!(3000));
        fields.insert("Unrelated", "ignored");

        let record = SourceRecord {
            id: "rec42".into(),
            fields,
            created_time: "2024-03-01T10:00:00.000Z".into(),
        };

        let normalized = normalize_record(&record, ResidencyType::R2);
        assert_eq!(normalized.external_id, "rec42");
        assert_eq!(normalized.name, "R2 | Acme Corp 03");
        assert_eq!(normalized.residency_type, ResidencyType::R2);
        assert_eq!(normalized.residency_title, "");
        assert_eq!(normalized.job_title, "Engineer");
        assert_eq!(normalized.monthly_salary.as_deref(), Some("3000"));
        assert_eq!(normalized.description, None);
        assert_eq!(normalized.created_at, "2024-03-01T10:00:00.000Z");
    }
}
