//! Health endpoint.
//!
//! The memory cache is process-local and always healthy; the persistent
//! tier is probed. A degraded database does not fail the endpoint — the
//! cache→upstream fallback still serves lookups.

use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

use super::AppState;

/// `GET /health` — aggregate tier health.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store_health = state.store.health_check().await;
    let status = if store_health.healthy { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "cache": {
            "healthy": true,
            "entries": state.cache.stats().total_entries,
        },
        "database": store_health,
    }))
}
