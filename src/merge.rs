//! Company merge
//!
//! Folds duplicate companies into one target. The target keeps every
//! absorbed slug as an alias so future syncs resolve those names to it
//! instead of recreating the duplicates.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::MergeError;
use crate::models::{Company, CompanyId};
use crate::store::ResidencyStore;

/// What a merge did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub target_id: CompanyId,
    /// Sources that existed and were folded in
    pub absorbed: Vec<CompanyId>,
    /// Sources that no longer exist
    pub skipped: Vec<CompanyId>,
    pub residencies_repointed: usize,
    /// Target alias set after the merge
    pub aliases: Vec<String>,
}

pub struct MergeEngine {
    store: Arc<dyn ResidencyStore>,
    lock: Mutex<()>,
}

impl MergeEngine {
    pub fn new(store: Arc<dyn ResidencyStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Merge `source_ids` into `target_id`.
    ///
    /// The combined alias set is written to the target before any source
    /// is deleted, so a merge that stops halfway still resolves every
    /// absorbed name to the target. Re-running a completed merge is a
    /// no-op apart from the report.
    pub async fn merge(
        &self,
        target_id: CompanyId,
        source_ids: &[CompanyId],
    ) -> Result<MergeReport, MergeError> {
        if source_ids.is_empty() {
            return Err(MergeError::NoSources);
        }

        let _guard = self.lock.lock().await;

        let target = self
            .store
            .get_company(target_id)
            .await?
            .ok_or(MergeError::TargetNotFound(target_id))?;

        let mut requested: Vec<CompanyId> = Vec::with_capacity(source_ids.len());
        for id in source_ids {
            if *id != target_id && !requested.contains(id) {
                requested.push(*id);
            }
        }

        let mut sources: Vec<Company> = Vec::with_capacity(requested.len());
        let mut skipped = Vec::new();
        for id in requested {
            match self.store.get_company(id).await? {
                Some(company) => sources.push(company),
                None => {
                    warn!(target = %target_id, source = %id, "Merge source not found, skipping");
                    skipped.push(id);
                }
            }
        }

        let aliases = merged_aliases(&target, &sources);
        if aliases != target.aliases {
            self.store.patch_company_aliases(target_id, &aliases).await?;
        }

        let mut residencies_repointed = 0;
        let mut absorbed = Vec::with_capacity(sources.len());
        for source in &sources {
            let residencies = self.store.list_residencies_by_company(source.id).await?;
            for residency in &residencies {
                self.store
                    .set_residency_company(residency.id, target_id)
                    .await?;
            }
            residencies_repointed += residencies.len();

            self.store.delete_company(source.id).await?;
            info!(
                target = %target_id,
                source = %source.id,
                slug = %source.slug,
                residencies = residencies.len(),
                "Absorbed company"
            );
            absorbed.push(source.id);
        }

        Ok(MergeReport {
            target_id,
            absorbed,
            skipped,
            residencies_repointed,
            aliases,
        })
    }
}

/// Target aliases, then each source's slug and aliases, deduplicated in
/// order and never containing the target's own slug.
fn merged_aliases(target: &Company, sources: &[Company]) -> Vec<String> {
    let candidates = target.aliases.iter().chain(
        sources
            .iter()
            .flat_map(|s| std::iter::once(&s.slug).chain(s.aliases.iter())),
    );

    let mut aliases: Vec<String> = Vec::new();
    for alias in candidates {
        if *alias != target.slug && !aliases.contains(alias) {
            aliases.push(alias.clone());
        }
    }
    aliases
}
