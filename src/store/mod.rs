//! Storage abstraction
//!
//! The ingestion core only talks to [`ResidencyStore`]. Each method is a
//! single atomic write or read; nothing spans multiple calls.
//! Implementations: [`InMemoryStore`] and, with the `database` feature,
//! [`PgStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Company, CompanyId, Residency, ResidencyFields, ResidencyId};

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "database")]
pub use postgres::{DatabaseConfig, PgStore};

/// Company and residency persistence
#[async_trait]
pub trait ResidencyStore: Send + Sync {
    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>, StoreError>;

    /// All companies, oldest first
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError>;

    /// First company (oldest first) whose alias set contains `slug`.
    ///
    /// The default scans [`list_companies`](Self::list_companies);
    /// backends with an alias index override it.
    async fn find_company_by_alias(&self, slug: &str) -> Result<Option<Company>, StoreError> {
        let companies = self.list_companies().await?;
        Ok(companies.into_iter().find(|c| c.has_alias(slug)))
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the slug is taken
    async fn create_company(&self, name: &str, slug: &str) -> Result<Company, StoreError>;

    async fn patch_company_aliases(
        &self,
        id: CompanyId,
        aliases: &[String],
    ) -> Result<(), StoreError>;

    async fn update_company_image(
        &self,
        id: CompanyId,
        image_id: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn update_company_website(
        &self,
        id: CompanyId,
        website: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Delete a company. Deleting a missing company is not an error.
    /// Residencies still pointing at it are left unresolved.
    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Residencies
    // ------------------------------------------------------------------

    async fn find_residency_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Residency>, StoreError>;

    async fn get_residency(&self, id: ResidencyId) -> Result<Option<Residency>, StoreError>;

    async fn list_residencies(&self) -> Result<Vec<Residency>, StoreError>;

    async fn list_residencies_by_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<Residency>, StoreError>;

    /// Fails with [`StoreError::CompanyNotFound`] if `company_id` names no
    /// live company; the same holds for the other residency writes.
    async fn insert_residency(
        &self,
        fields: &ResidencyFields,
        company_id: Option<CompanyId>,
        synced_at: DateTime<Utc>,
    ) -> Result<ResidencyId, StoreError>;

    /// Overwrite all synced fields of an existing residency
    async fn patch_residency(
        &self,
        id: ResidencyId,
        fields: &ResidencyFields,
        company_id: Option<CompanyId>,
        synced_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn set_residency_company(
        &self,
        id: ResidencyId,
        company_id: CompanyId,
    ) -> Result<(), StoreError>;

    async fn update_residency_description(
        &self,
        id: ResidencyId,
        description: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn update_residency_location(
        &self,
        id: ResidencyId,
        location: Option<&str>,
    ) -> Result<(), StoreError>;
}
