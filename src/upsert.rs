//! Residency upsert
//!
//! Writes a batch of normalized records keyed on the source record id.
//! Existing rows are patched in place, so internal identity and the
//! operator-owned `location` survive every sync.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::models::{CompanyId, ResidencyFields};
use crate::normalize::extract_company_name;
use crate::resolver::CompanyResolver;
use crate::store::ResidencyStore;

/// Outcome counts of one upsert batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    pub inserted: usize,
    pub updated: usize,
    /// Stored without a company (empty slug)
    pub unresolved: usize,
    pub failed: usize,
}

impl UpsertReport {
    /// Records written, new or updated
    pub fn synced(&self) -> usize {
        self.inserted + self.updated
    }
}

enum Written {
    Inserted,
    Updated,
}

#[derive(Clone)]
pub struct UpsertEngine {
    store: Arc<dyn ResidencyStore>,
    resolver: CompanyResolver,
}

impl UpsertEngine {
    pub fn new(store: Arc<dyn ResidencyStore>) -> Self {
        let resolver = CompanyResolver::new(store.clone());
        Self { store, resolver }
    }

    /// Upsert every record with a shared `synced_at`.
    ///
    /// A failing record is logged and counted; the rest of the batch
    /// still runs. Residencies missing from the batch are left alone.
    pub async fn upsert(&self, records: &[ResidencyFields]) -> UpsertReport {
        let synced_at = Utc::now();
        let mut report = UpsertReport::default();

        for fields in records {
            match self.upsert_one(fields, synced_at).await {
                Ok((written, company_id)) => {
                    match written {
                        Written::Inserted => report.inserted += 1,
                        Written::Updated => report.updated += 1,
                    }
                    if company_id.is_none() {
                        report.unresolved += 1;
                    }
                }
                Err(e) => {
                    error!(
                        external_id = %fields.external_id,
                        error = %e,
                        "Failed to upsert residency"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            inserted = report.inserted,
            updated = report.updated,
            unresolved = report.unresolved,
            failed = report.failed,
            "Upsert batch complete"
        );

        report
    }

    async fn upsert_one(
        &self,
        fields: &ResidencyFields,
        synced_at: DateTime<Utc>,
    ) -> Result<(Written, Option<CompanyId>), StoreError> {
        let display_name = extract_company_name(&fields.name);
        let company_id = self.resolver.resolve(&display_name).await?.map(|c| c.id);

        match self
            .store
            .find_residency_by_external_id(&fields.external_id)
            .await?
        {
            Some(existing) => {
                self.store
                    .patch_residency(existing.id, fields, company_id, synced_at)
                    .await?;
                debug!(external_id = %fields.external_id, id = %existing.id, "Updated residency");
                Ok((Written::Updated, company_id))
            }
            None => {
                let id = self
                    .store
                    .insert_residency(fields, company_id, synced_at)
                    .await?;
                debug!(external_id = %fields.external_id, id = %id, "Inserted residency");
                Ok((Written::Inserted, company_id))
            }
        }
    }
}
