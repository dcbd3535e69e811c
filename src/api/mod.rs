//! REST API for browsing listings and curating companies
//!
//! Read endpoints are open. Mutating endpoints require the shared admin
//! secret in the `x-admin-password` header.

pub mod company_routes;
pub mod residency_routes;
pub mod sync_routes;

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::{MergeError, StoreError, SyncError};
use crate::merge::MergeEngine;
use crate::store::ResidencyStore;
use crate::sync::SyncService;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ResidencyStore>,
    pub sync: SyncService,
    pub merge: Arc<MergeEngine>,
    pub admin_password: Option<String>,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn ResidencyStore>,
        sync: SyncService,
        admin_password: Option<String>,
    ) -> Self {
        let merge = Arc::new(MergeEngine::new(store.clone()));
        Self {
            store,
            sync,
            merge,
            admin_password,
        }
    }

    /// Check the admin secret.
    ///
    /// An unconfigured server secret is a server error, not a client one,
    /// so the UI can tell "ask again" apart from "broken deployment".
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let expected = self
            .admin_password
            .as_deref()
            .ok_or(ApiError::AdminNotConfigured)?;

        let supplied = headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        if secrets_match(supplied, expected) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

/// Constant-time secret comparison. Both sides are hashed first so the
/// length of the configured secret does not leak either.
fn secrets_match(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    supplied.as_slice().ct_eq(expected.as_slice()).into()
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler errors, mapped onto status codes with generic messages
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Admin access is not configured")]
    AdminNotConfigured,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AdminNotConfigured | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CompanyNotFound(_) => ApiError::NotFound("Company not found".into()),
            StoreError::ResidencyNotFound(_) => ApiError::NotFound("Residency not found".into()),
            other => {
                error!(error = %other, "Store error");
                ApiError::Internal
            }
        }
    }
}

impl From<MergeError> for ApiError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::NoSources => {
                ApiError::BadRequest("At least one source company is required".into())
            }
            MergeError::TargetNotFound(_) => {
                ApiError::NotFound("Target company not found".into())
            }
            MergeError::Store(e) => e.into(),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::AlreadyRunning => ApiError::Conflict("A sync is already running".into()),
            other => {
                error!(error = %other, "Sync failed");
                ApiError::Internal
            }
        }
    }
}

/// Build the full API router with CORS and request tracing
pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(sync_routes::router())
        .merge(residency_routes::router())
        .merge(company_routes::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Empty strings clear a field
pub(crate) fn clear_if_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("hunter2", "hunter2"));
        assert!(!secrets_match("hunter3", "hunter2"));
        assert!(!secrets_match("hunter", "hunter2"));
        assert!(!secrets_match("", "hunter2"));
    }

    #[test]
    fn test_require_admin() {
        let store: Arc<dyn ResidencyStore> = Arc::new(crate::store::InMemoryStore::new());
        let sync = SyncService::new(
            crate::config::SourceConfig::new(Vec::new(), None),
            store.clone(),
        );
        let state = ApiState::new(store, sync, Some("hunter2".into()));

        let mut headers = HeaderMap::new();
        assert!(matches!(
            state.require_admin(&headers),
            Err(ApiError::Unauthorized)
        ));

        headers.insert(ADMIN_PASSWORD_HEADER, HeaderValue::from_static("hunter2"));
        assert!(state.require_admin(&headers).is_ok());

        headers.insert(ADMIN_PASSWORD_HEADER, HeaderValue::from_static("hunter2 "));
        assert!(matches!(
            state.require_admin(&headers),
            Err(ApiError::Unauthorized)
        ));
    }
}
