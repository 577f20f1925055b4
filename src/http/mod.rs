//! REST surface.
//!
//! Thin translation layer over the lookup service and the cache-admin
//! operations. Error kinds map to status codes and a stable
//! `{ "error": { "message", "type" } }` envelope; the tiers themselves only
//! raise distinguishable kinds.

pub mod cache_admin;
pub mod health;
pub mod models;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::Error;
use crate::cache::MemoryCache;
use crate::service::ModelLookupService;
use crate::store::ModelStore;

/// Shared handler state, wired once at the composition root.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ModelLookupService>,
    pub cache: Arc<MemoryCache>,
    pub store: Arc<dyn ModelStore>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/models", get(models::list_models))
        .route("/api/models/{id}", get(models::get_model))
        .route("/api/cache/invalidate", post(cache_admin::invalidate))
        .route("/api/cache/stats", get(cache_admin::stats))
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error wrapper implementing the response envelope.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self.0 {
            Error::ModelNotFound(_) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Model not found".to_string(),
            ),
            err => (StatusCode::INTERNAL_SERVER_ERROR, "api_error", err.to_string()),
        };
        let body = json!({ "error": { "message": message, "type": kind } });
        (status, Json(body)).into_response()
    }
}

/// Bearer gate for the cache-admin routes.
///
/// Placeholder check, not a security model: any non-empty token passes.
pub(crate) fn require_bearer(headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if !token.is_empty() => Ok(()),
        _ => {
            let body = json!({ "error": { "message": "Unauthorized", "type": "unauthorized" } });
            Err((StatusCode::UNAUTHORIZED, Json(body)).into_response())
        }
    }
}
