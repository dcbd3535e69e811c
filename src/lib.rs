//! Residency Sync - listing ingestion and company curation
//!
//! Pulls residency (job) listings from a hosted spreadsheet-style source,
//! normalizes them, resolves each listing to a deduplicated company and
//! upserts the result into a store. Operators fold duplicate companies
//! together with a merge that leaves aliases behind, so later syncs keep
//! resolving the old names to the surviving company.
//!
//! ## Pipeline
//! Source Client -> Record Normalizer -> Company Resolver -> Upsert Engine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use residency_sync::{config::AppConfig, store::InMemoryStore, sync::SyncService};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::from_env()?;
//! let sync = SyncService::new(config.source, Arc::new(InMemoryStore::new()));
//! let report = sync.run().await?;
//! println!("synced {} residencies", report.synced);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Domain types and configuration
pub mod config;
pub mod models;

// Ingestion
pub mod normalize;
pub mod source;
pub mod sync;
pub mod upsert;

// Company registry
pub mod merge;
pub mod resolver;

// Persistence and read-side queries
pub mod catalog;
pub mod store;

pub mod scheduler;

// REST API (when enabled)
#[cfg(feature = "server")]
pub mod api;

pub use error::{ConfigError, MergeError, SourceError, StoreError, SyncError};
pub use merge::{MergeEngine, MergeReport};
pub use models::{Company, CompanyId, Residency, ResidencyFields, ResidencyId, ResidencyType};
pub use resolver::CompanyResolver;
pub use store::{InMemoryStore, ResidencyStore};
pub use sync::{SyncReport, SyncService};
pub use upsert::{UpsertEngine, UpsertReport};
