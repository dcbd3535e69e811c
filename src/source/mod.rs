//! Upstream listing source
//!
//! This module provides:
//! - Wire types for list and detail responses
//! - A client that fetches all configured endpoints with per-endpoint and
//!   per-record failure isolation

pub mod client;
pub mod types;

pub use client::{EndpointFetch, FetchOutcome, SourceClient};
pub use types::*;
