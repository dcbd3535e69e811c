//! Sync orchestration
//!
//! One run: fetch every endpoint, normalize, upsert. Endpoint and record
//! failures are absorbed by the layers below; the only fatal conditions
//! are a missing credential and a run already in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::error::SyncError;
use crate::models::ResidencyFields;
use crate::normalize::normalize_record;
use crate::source::SourceClient;
use crate::store::ResidencyStore;
use crate::upsert::{UpsertEngine, UpsertReport};

/// Result of one sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Residencies written (inserted + updated)
    pub synced: usize,
    /// Records received from the source
    pub fetched: usize,
    pub endpoints_ok: usize,
    pub endpoints_failed: usize,
    pub upsert: UpsertReport,
}

/// Clears the running flag when the run ends, including on panic
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                running: running.clone(),
            })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct SyncService {
    config: SourceConfig,
    upsert: UpsertEngine,
    running: Arc<AtomicBool>,
}

impl SyncService {
    pub fn new(config: SourceConfig, store: Arc<dyn ResidencyStore>) -> Self {
        Self {
            config,
            upsert: UpsertEngine::new(store),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one full sync
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let token = self
            .config
            .jwt_token
            .as_deref()
            .ok_or(SyncError::MissingCredential)?;

        let _guard = RunGuard::acquire(&self.running).ok_or(SyncError::AlreadyRunning)?;

        let client = SourceClient::from_config(&self.config, token)?;
        info!(endpoints = self.config.endpoints.len(), "Starting sync");

        let outcome = client.fetch_all(&self.config.endpoints).await;
        if outcome.endpoints_failed > 0 {
            warn!(
                failed = outcome.endpoints_failed,
                ok = outcome.endpoints_ok,
                "Some endpoints failed; their listings are not refreshed this run"
            );
        }

        let records: Vec<ResidencyFields> = outcome
            .records
            .iter()
            .map(|raw| normalize_record(&raw.record, raw.residency_type))
            .collect();

        let upsert = self.upsert.upsert(&records).await;

        let report = SyncReport {
            synced: upsert.synced(),
            fetched: records.len(),
            endpoints_ok: outcome.endpoints_ok,
            endpoints_failed: outcome.endpoints_failed,
            upsert,
        };

        info!(
            synced = report.synced,
            fetched = report.fetched,
            detail_failures = outcome.detail_failures,
            "Sync complete"
        );

        Ok(report)
    }
}
