//! Health and sync trigger endpoints

use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::info;

use super::{ApiError, ApiState};
use crate::sync::SyncReport;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sync_running: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced: usize,
    pub report: SyncReport,
}

/// GET /api/health
async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sync_running: state.sync.is_running(),
    })
}

/// POST /api/sync
async fn trigger_sync(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<SyncResponse>, ApiError> {
    state.require_admin(&headers)?;

    info!("Manual sync triggered");
    let report = state.sync.run().await?;

    Ok(Json(SyncResponse {
        synced: report.synced,
        report,
    }))
}

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sync", post(trigger_sync))
}
