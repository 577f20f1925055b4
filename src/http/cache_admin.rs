//! Cache-admin endpoints: invalidation and statistics.
//!
//! Bearer-gated by the placeholder check in [`super::require_bearer`].

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use super::AppState;

/// Body for `POST /api/cache/invalidate`. Omitting `key` (or the whole
/// body) clears the entire cache.
#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(default)]
    pub key: Option<String>,
}

/// `POST /api/cache/invalidate` — delete one key or clear all.
///
/// Responds with the list of keys actually invalidated.
pub async fn invalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<InvalidateRequest>>,
) -> Response {
    if let Err(denied) = super::require_bearer(&headers) {
        return denied;
    }
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let invalidated_keys = match request.key {
        Some(key) => {
            if state.cache.delete(&key) {
                vec![key]
            } else {
                Vec::new()
            }
        }
        None => {
            let keys = state.cache.keys();
            state.cache.clear();
            keys
        }
    };

    Json(json!({
        "success": true,
        "message": "Cache invalidated successfully",
        "invalidated_keys": invalidated_keys,
    }))
    .into_response()
}

/// `GET /api/cache/stats` — the cache tier's statistics, verbatim.
pub async fn stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = super::require_bearer(&headers) {
        return denied;
    }
    Json(state.cache.stats()).into_response()
}
