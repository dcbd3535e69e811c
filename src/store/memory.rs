//! In-memory store
//!
//! Backs tests and `--memory` runs. One `RwLock` guards all state so every
//! trait call is atomic, matching the per-record guarantee of PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::ResidencyStore;
use crate::error::StoreError;
use crate::models::{Company, CompanyId, Residency, ResidencyFields, ResidencyId};

#[derive(Debug, Default)]
struct Inner {
    /// Creation order
    companies: Vec<Company>,
    residencies: HashMap<ResidencyId, Residency>,
    by_external_id: HashMap<String, ResidencyId>,
}

impl Inner {
    fn company_mut(&mut self, id: CompanyId) -> Result<&mut Company, StoreError> {
        self.companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::CompanyNotFound(id))
    }

    /// A residency may only point at a live company
    fn check_company(&self, company_id: Option<CompanyId>) -> Result<(), StoreError> {
        match company_id {
            Some(id) if !self.companies.iter().any(|c| c.id == id) => {
                Err(StoreError::CompanyNotFound(id))
            }
            _ => Ok(()),
        }
    }

    fn residency_mut(&mut self, id: ResidencyId) -> Result<&mut Residency, StoreError> {
        self.residencies
            .get_mut(&id)
            .ok_or(StoreError::ResidencyNotFound(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed company, e.g. test fixtures with aliases
    pub async fn insert_company(&self, company: Company) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.companies.iter().any(|c| c.slug == company.slug) {
            return Err(StoreError::Duplicate(format!("company slug {}", company.slug)));
        }
        inner.companies.push(company);
        Ok(())
    }

    pub async fn company_count(&self) -> usize {
        self.inner.read().await.companies.len()
    }

    pub async fn residency_count(&self) -> usize {
        self.inner.read().await.residencies.len()
    }
}

#[async_trait]
impl ResidencyStore for InMemoryStore {
    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.companies.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        Ok(self.inner.read().await.companies.clone())
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn create_company(&self, name: &str, slug: &str) -> Result<Company, StoreError> {
        let company = Company::new(name, slug);
        self.insert_company(company.clone()).await?;
        Ok(company)
    }

    async fn patch_company_aliases(
        &self,
        id: CompanyId,
        aliases: &[String],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.company_mut(id)?.aliases = aliases.to_vec();
        Ok(())
    }

    async fn update_company_image(
        &self,
        id: CompanyId,
        image_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.company_mut(id)?.image_id = image_id.map(String::from);
        Ok(())
    }

    async fn update_company_website(
        &self,
        id: CompanyId,
        website: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.company_mut(id)?.website = website.map(String::from);
        Ok(())
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.companies.retain(|c| c.id != id);
        for residency in inner.residencies.values_mut() {
            if residency.company_id == Some(id) {
                residency.company_id = None;
            }
        }
        Ok(())
    }

    async fn find_residency_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Residency>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external_id
            .get(external_id)
            .and_then(|id| inner.residencies.get(id))
            .cloned())
    }

    async fn get_residency(&self, id: ResidencyId) -> Result<Option<Residency>, StoreError> {
        Ok(self.inner.read().await.residencies.get(&id).cloned())
    }

    async fn list_residencies(&self) -> Result<Vec<Residency>, StoreError> {
        let inner = self.inner.read().await;
        let mut residencies: Vec<Residency> = inner.residencies.values().cloned().collect();
        residencies.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        Ok(residencies)
    }

    async fn list_residencies_by_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<Residency>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .residencies
            .values()
            .filter(|r| r.company_id == Some(company_id))
            .cloned()
            .collect())
    }

    async fn insert_residency(
        &self,
        fields: &ResidencyFields,
        company_id: Option<CompanyId>,
        synced_at: DateTime<Utc>,
    ) -> Result<ResidencyId, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_company(company_id)?;
        if inner.by_external_id.contains_key(&fields.external_id) {
            return Err(StoreError::Duplicate(format!(
                "residency external id {}",
                fields.external_id
            )));
        }

        let id = ResidencyId::new();
        let residency = Residency::from_fields(id, fields.clone(), company_id, synced_at);
        inner.by_external_id.insert(fields.external_id.clone(), id);
        inner.residencies.insert(id, residency);
        Ok(id)
    }

    async fn patch_residency(
        &self,
        id: ResidencyId,
        fields: &ResidencyFields,
        company_id: Option<CompanyId>,
        synced_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_company(company_id)?;
        let residency = inner.residency_mut(id)?;
        let previous_external_id = residency.external_id.clone();
        residency.apply_fields(fields.clone(), company_id, synced_at);

        if previous_external_id != fields.external_id {
            inner.by_external_id.remove(&previous_external_id);
            inner.by_external_id.insert(fields.external_id.clone(), id);
        }
        Ok(())
    }

    async fn set_residency_company(
        &self,
        id: ResidencyId,
        company_id: CompanyId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_company(Some(company_id))?;
        inner.residency_mut(id)?.company_id = Some(company_id);
        Ok(())
    }

    async fn update_residency_description(
        &self,
        id: ResidencyId,
        description: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.residency_mut(id)?.description = description.map(String::from);
        Ok(())
    }

    async fn update_residency_location(
        &self,
        id: ResidencyId,
        location: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.residency_mut(id)?.location = location.map(String::from);
        Ok(())
    }
}
