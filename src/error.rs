//! Error types for ingestion, storage and company curation
//!
//! Each concern gets its own `thiserror` enum. Source errors are absorbed
//! per endpoint / per record by the sync path; the others surface to the
//! caller.

use thiserror::Error;

use crate::models::{CompanyId, ResidencyId};

/// Errors talking to the upstream listing source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode source response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Pagination exceeded {max_pages} pages")]
    TooManyPages { max_pages: usize },

    #[error("Detail response contained no records")]
    EmptyDetail,
}

/// Errors from a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Company {0} not found")]
    CompanyNotFound(CompanyId),

    #[error("Residency {0} not found")]
    ResidencyNotFound(ResidencyId),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

/// Fatal errors of a sync run
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("SOURCE_JWT_TOKEN is not set")]
    MissingCredential,

    #[error("A sync run is already in progress")]
    AlreadyRunning,

    #[error("Source client setup failed: {0}")]
    Client(#[from] SourceError),
}

/// Errors of a company merge
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Merge requires at least one source company")]
    NoSources,

    #[error("Target company {0} not found")]
    TargetNotFound(CompanyId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid URL for endpoint '{label}': {source}")]
    InvalidUrl {
        label: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse endpoint file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
