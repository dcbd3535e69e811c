//! Listing source wire types
//!
//! The source is an Airtable-backed data API. List and detail calls return
//! `records` with a loosely-typed `fields` object, so fields are kept as
//! raw JSON and read permissively.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ResidencyType;

pub const FIELD_NAME: &str = "Name";
pub const FIELD_RESIDENCY_TITLE: &str = "Residency Title";
pub const FIELD_JOB_TITLE: &str = "Job Title";
pub const FIELD_JOB_DESCRIPTION: &str = "Job Description";
pub const FIELD_EMAIL: &str = "Email Application Address";
pub const FIELD_MONTHLY_SALARY: &str = "Monthly Salary";
pub const FIELD_ACCOMMODATION: &str = "Accommodation Support";

/// One page of a list call
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub records: Vec<SourceRecord>,
    /// Cursor for the next page; absent or null on the last page
    #[serde(default)]
    pub offset: Option<Value>,
}

impl ListResponse {
    /// Next-page cursor, if the source handed one out
    pub fn next_offset(&self) -> Option<String> {
        match self.offset.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A record as listed by the source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceRecord {
    pub id: String,
    #[serde(default)]
    pub fields: RecordFields,
    #[serde(rename = "createdTime", default)]
    pub created_time: String,
}

/// Detail lookup response
#[derive(Debug, Clone, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub records: Vec<DetailRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub fields: RecordFields,
}

/// Untyped field bag of a source record
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RecordFields(pub Map<String, Value>);

impl RecordFields {
    /// Read a field as text.
    ///
    /// Strings are trimmed, numbers and booleans are rendered, arrays of
    /// scalars are joined with `", "`. Empty values read as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        let rendered = match self.0.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null | Value::Object(_) => return None,
        };

        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }
}

/// A source record tagged with the program type of its endpoint
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub residency_type: ResidencyType,
    pub record: SourceRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_parses_with_missing_offset() {
        let page: ListResponse = serde_json::from_value(json!({
            "records": [{"id": "rec1", "fields": {"Name": "R1 | Acme"}, "createdTime": "2024-01-01T00:00:00.000Z"}]
        }))
        .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_offset(), None);
    }

    #[test]
    fn test_next_offset_ignores_empty_and_null() {
        let page: ListResponse =
            serde_json::from_value(json!({"records": [], "offset": ""})).unwrap();
        assert_eq!(page.next_offset(), None);

        let page: ListResponse =
            serde_json::from_value(json!({"records": [], "offset": null})).unwrap();
        assert_eq!(page.next_offset(), None);

        let page: ListResponse =
            serde_json::from_value(json!({"records": [], "offset": "itr/rec9"})).unwrap();
        assert_eq!(page.next_offset().as_deref(), Some("itr/rec9"));
    }

    #[test]
    fn test_field_text_is_permissive() {
        let fields: RecordFields = serde_json::from_value(json!({
            "Name": "  Acme  ",
            "Monthly Salary": 2500,
            "Accommodation Support": ["Housing", "Travel"],
            "Job Description": "   ",
            "Email Application Address": null,
            "Nested": {"a": 1}
        }))
        .unwrap();

        assert_eq!(fields.text(FIELD_NAME).as_deref(), Some("Acme"));
        assert_eq!(fields.text(FIELD_MONTHLY_SALARY).as_deref(), Some("2500"));
        assert_eq!(
            fields.text(FIELD_ACCOMMODATION).as_deref(),
            Some("Housing, Travel")
        );
        assert_eq!(fields.text(FIELD_JOB_DESCRIPTION), None);
        assert_eq!(fields.text(FIELD_EMAIL), None);
        assert_eq!(fields.text("Nested"), None);
        assert_eq!(fields.text("Missing"), None);
    }
}
