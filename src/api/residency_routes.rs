//! Residency listing endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{clear_if_empty, ApiError, ApiState};
use crate::catalog;
use crate::models::{ResidencyId, ResidencyWithCompany};

/// Operator edits; absent fields are left alone, empty ones cleared
#[derive(Debug, Deserialize)]
pub struct PatchResidencyRequest {
    pub description: Option<String>,
    pub location: Option<String>,
}

/// GET /api/residencies
async fn list_residencies(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ResidencyWithCompany>>, ApiError> {
    let listings = catalog::list_residencies_with_companies(state.store.as_ref()).await?;
    Ok(Json(listings))
}

/// GET /api/residencies/:id
async fn get_residency(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResidencyWithCompany>, ApiError> {
    catalog::get_residency_with_company(state.store.as_ref(), ResidencyId(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Residency not found".into()))
}

/// PATCH /api/residencies/:id
async fn patch_residency(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<PatchResidencyRequest>,
) -> Result<Json<ResidencyWithCompany>, ApiError> {
    state.require_admin(&headers)?;
    let id = ResidencyId(id);

    if let Some(description) = &req.description {
        state
            .store
            .update_residency_description(id, clear_if_empty(description))
            .await?;
    }
    if let Some(location) = &req.location {
        state
            .store
            .update_residency_location(id, clear_if_empty(location))
            .await?;
    }

    catalog::get_residency_with_company(state.store.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Residency not found".into()))
}

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/residencies", get(list_residencies))
        .route(
            "/api/residencies/:id",
            get(get_residency).patch(patch_residency),
        )
}
