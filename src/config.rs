//! Runtime configuration
//!
//! Everything is read from environment variables (binaries call
//! `dotenvy::dotenv()` first). The source endpoint list is built in and can
//! be replaced by a YAML file named in `SOURCE_ENDPOINTS_FILE`.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::models::ResidencyType;

const DATASOURCE_BASE: &str = "https://sheryl9652.preview.softr.app/v1/datasource/airtable/1a4e99c5-7a8f-4323-b0d5-aaa96a38141c/ae026310-d476-499d-bb4d-a126de2c0378";

/// Built-in list endpoints: program label and the table/view path below
/// [`DATASOURCE_BASE`]
const DEFAULT_ENDPOINTS: &[(ResidencyType, &str)] = &[
    (
        ResidencyType::R1,
        "7b879f15-4c21-464d-8b99-4620a0e320b0/fb5530e8-e944-4c77-81e6-b38bc987396b/data",
    ),
    (
        ResidencyType::R1R2,
        "8cfabc27-6292-40e3-bd4f-fed6b8fc3a2c/cd955d21-6984-43fb-a6dc-4d4b35127ec4/data",
    ),
    (
        ResidencyType::R2,
        "99d9522a-421a-467e-a645-73a89ed71bf0/f57e3170-bf24-4bb6-92f9-814e08ab32c4/data",
    ),
    (
        ResidencyType::R3,
        "cd82fbb7-b0da-42e5-afd6-0adf9faf6757/478384e9-5ad7-47a6-8411-a9474249fdc0/data",
    ),
    (
        ResidencyType::R4,
        "9857663e-7306-4961-b035-3688fd4a4471/d3a4d32d-f920-44a3-89a2-0705b30a6890/data",
    ),
];

/// One source endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Program type every record of this endpoint is tagged with
    pub residency_type: ResidencyType,
    pub list_url: Url,
    /// Per-record detail lookup, used for the long-form description
    pub detail_url: Option<Url>,
}

impl EndpointConfig {
    pub fn new(residency_type: ResidencyType, list_url: Url) -> Self {
        Self {
            residency_type,
            list_url,
            detail_url: None,
        }
    }

    pub fn with_detail(mut self, detail_url: Url) -> Self {
        self.detail_url = Some(detail_url);
        self
    }
}

#[derive(Debug, Deserialize)]
struct EndpointFile {
    endpoints: Vec<EndpointEntry>,
}

#[derive(Debug, Deserialize)]
struct EndpointEntry {
    label: ResidencyType,
    list_url: String,
    #[serde(default)]
    detail_url: Option<String>,
}

/// Source client settings
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub endpoints: Vec<EndpointConfig>,
    /// Session token sent as the `jwtToken` cookie; required at sync time
    pub jwt_token: Option<String>,
    pub timeout: Duration,
    pub detail_concurrency: usize,
    pub max_pages: usize,
}

impl SourceConfig {
    pub fn new(endpoints: Vec<EndpointConfig>, jwt_token: Option<String>) -> Self {
        Self {
            endpoints,
            jwt_token,
            timeout: Duration::from_secs(30),
            detail_concurrency: 4,
            max_pages: 100,
        }
    }
}

/// Daily sync slot, UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { hour: 21, minute: 0 }
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub admin_password: Option<String>,
    pub bind_addr: String,
    pub source: SourceConfig,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoints = match non_empty(lookup("SOURCE_ENDPOINTS_FILE")) {
            Some(path) => load_endpoints_file(Path::new(&path))?,
            None => default_endpoints()?,
        };

        let mut source = SourceConfig::new(endpoints, non_empty(lookup("SOURCE_JWT_TOKEN")));
        source.timeout = Duration::from_secs(parse_or(&lookup, "SOURCE_TIMEOUT_SECS", 30u64)?);
        source.detail_concurrency = parse_or(&lookup, "SOURCE_DETAIL_CONCURRENCY", 4usize)?.max(1);
        source.max_pages = parse_or(&lookup, "SOURCE_MAX_PAGES", 100usize)?.max(1);

        let schedule = ScheduleConfig {
            hour: parse_or(&lookup, "SYNC_HOUR_UTC", 21u32)?,
            minute: parse_or(&lookup, "SYNC_MINUTE_UTC", 0u32)?,
        };
        if schedule.hour > 23 {
            return Err(invalid("SYNC_HOUR_UTC", schedule.hour, "must be 0-23"));
        }
        if schedule.minute > 59 {
            return Err(invalid("SYNC_MINUTE_UTC", schedule.minute, "must be 0-59"));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgresql://localhost:5432/residencies".to_string()),
            database_pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", 10u32)?,
            admin_password: non_empty(lookup("ADMIN_PASSWORD")),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            source,
            schedule,
        })
    }
}

/// Built-in endpoint list
pub fn default_endpoints() -> Result<Vec<EndpointConfig>, ConfigError> {
    DEFAULT_ENDPOINTS
        .iter()
        .map(|(residency_type, path)| {
            let url = format!("{}/{}", DATASOURCE_BASE, path);
            parse_url(residency_type.as_str(), &url)
                .map(|list_url| EndpointConfig::new(*residency_type, list_url))
        })
        .collect()
}

/// Load an endpoint list from YAML.
///
/// ```yaml
/// endpoints:
///   - label: R1
///     list_url: https://example.org/r1/data
///     detail_url: https://example.org/r1/detail
/// ```
pub fn load_endpoints_file(path: &Path) -> Result<Vec<EndpointConfig>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_endpoints_yaml(&text)
}

pub fn parse_endpoints_yaml(text: &str) -> Result<Vec<EndpointConfig>, ConfigError> {
    let file: EndpointFile = serde_yaml::from_str(text)?;

    file.endpoints
        .into_iter()
        .map(|entry| {
            let label = entry.label.as_str();
            let list_url = parse_url(label, &entry.list_url)?;
            let detail_url = entry
                .detail_url
                .as_deref()
                .map(|u| parse_url(label, u))
                .transpose()?;
            Ok(EndpointConfig {
                residency_type: entry.label,
                list_url,
                detail_url,
            })
        })
        .collect()
}

fn parse_url(label: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        label: label.to_string(),
        source,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match non_empty(lookup(key)) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| invalid(key, &raw, e.to_string())),
    }
}

fn invalid(key: &str, value: impl Display, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}
