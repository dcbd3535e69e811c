//! Company resolution
//!
//! Maps a company display name onto a company in the registry: canonical
//! slug first, then the alias set left behind by merges, then a new
//! company.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::Company;
use crate::normalize::slugify;
use crate::store::ResidencyStore;

#[derive(Clone)]
pub struct CompanyResolver {
    store: Arc<dyn ResidencyStore>,
}

impl CompanyResolver {
    pub fn new(store: Arc<dyn ResidencyStore>) -> Self {
        Self { store }
    }

    /// Find or create the company for `display_name`.
    ///
    /// Returns `Ok(None)` when the name has no slug (nothing alphanumeric
    /// survives normalization); such residencies stay unresolved.
    pub async fn resolve(&self, display_name: &str) -> Result<Option<Company>, StoreError> {
        let slug = slugify(display_name);
        if slug.is_empty() {
            debug!(name = display_name, "Company name has no slug, leaving unresolved");
            return Ok(None);
        }

        if let Some(company) = self.lookup(&slug).await? {
            return Ok(Some(company));
        }

        match self.store.create_company(display_name, &slug).await {
            Ok(company) => {
                info!(slug = %slug, id = %company.id, "Created company");
                Ok(Some(company))
            }
            // Another writer created it between lookup and insert; it may
            // since have been merged away, leaving only an alias
            Err(StoreError::Duplicate(_)) => self.lookup(&slug).await,
            Err(e) => Err(e),
        }
    }

    /// Canonical slug first, then merge aliases
    async fn lookup(&self, slug: &str) -> Result<Option<Company>, StoreError> {
        if let Some(company) = self.store.find_company_by_slug(slug).await? {
            return Ok(Some(company));
        }

        let aliased = self.store.find_company_by_alias(slug).await?;
        if let Some(company) = &aliased {
            debug!(slug = %slug, company = %company.slug, "Resolved company via alias");
        }
        Ok(aliased)
    }
}
