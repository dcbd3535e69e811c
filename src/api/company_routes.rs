//! Company endpoints: listing, metadata edits, merge

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{clear_if_empty, ApiError, ApiState};
use crate::catalog;
use crate::merge::MergeReport;
use crate::models::{Company, CompanyId};

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub target_id: CompanyId,
    pub source_ids: Vec<CompanyId>,
}

#[derive(Debug, Deserialize)]
pub struct PatchCompanyRequest {
    pub image_id: Option<String>,
    pub website: Option<String>,
}

/// GET /api/companies
async fn list_companies(State(state): State<ApiState>) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(catalog::list_companies_sorted(state.store.as_ref()).await?))
}

/// POST /api/companies/merge
async fn merge_companies(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeReport>, ApiError> {
    state.require_admin(&headers)?;

    let report = state.merge.merge(req.target_id, &req.source_ids).await?;
    info!(
        target = %report.target_id,
        absorbed = report.absorbed.len(),
        skipped = report.skipped.len(),
        "Companies merged"
    );

    Ok(Json(report))
}

/// PATCH /api/companies/:id
async fn patch_company(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<PatchCompanyRequest>,
) -> Result<Json<Company>, ApiError> {
    state.require_admin(&headers)?;
    let id = CompanyId(id);

    if let Some(image_id) = &req.image_id {
        state
            .store
            .update_company_image(id, clear_if_empty(image_id))
            .await?;
    }
    if let Some(website) = &req.website {
        state
            .store
            .update_company_website(id, clear_if_empty(website))
            .await?;
    }

    state
        .store
        .get_company(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Company not found".into()))
}

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/companies", get(list_companies))
        .route("/api/companies/merge", post(merge_companies))
        .route("/api/companies/:id", patch(patch_company))
}
