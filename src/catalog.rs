//! Read-side queries for the browsing surface

use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::{Company, ResidencyId, ResidencyWithCompany};
use crate::store::ResidencyStore;

/// Every residency with its company, ordered case-insensitively by
/// company name (the raw listing name when unresolved).
pub async fn list_residencies_with_companies(
    store: &dyn ResidencyStore,
) -> Result<Vec<ResidencyWithCompany>, StoreError> {
    let companies: HashMap<_, _> = store
        .list_companies()
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut listings: Vec<ResidencyWithCompany> = store
        .list_residencies()
        .await?
        .into_iter()
        .map(|residency| {
            let company = residency
                .company_id
                .and_then(|id| companies.get(&id).cloned());
            ResidencyWithCompany { residency, company }
        })
        .collect();

    listings.sort_by_cached_key(|l| l.sort_name().to_lowercase());
    Ok(listings)
}

pub async fn get_residency_with_company(
    store: &dyn ResidencyStore,
    id: ResidencyId,
) -> Result<Option<ResidencyWithCompany>, StoreError> {
    let Some(residency) = store.get_residency(id).await? else {
        return Ok(None);
    };

    let company = match residency.company_id {
        Some(company_id) => store.get_company(company_id).await?,
        None => None,
    };

    Ok(Some(ResidencyWithCompany { residency, company }))
}

/// All companies, case-insensitive by name
pub async fn list_companies_sorted(store: &dyn ResidencyStore) -> Result<Vec<Company>, StoreError> {
    let mut companies = store.list_companies().await?;
    companies.sort_by_cached_key(|c| c.name.to_lowercase());
    Ok(companies)
}
