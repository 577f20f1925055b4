//! Model catalogue endpoints.

use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{Value, json};

use super::{ApiError, AppState};

/// `GET /api/models` — the full free-model collection.
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let models = state.service.fetch_all().await?;
    Ok(Json(json!({ "data": models })))
}

/// `GET /api/models/{id}` — one model by id.
///
/// Model ids contain slashes (`vendor/model`), so the route parameter
/// captures the URL-encoded form and axum decodes it.
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let model = state.service.fetch_by_id(&id).await?;
    Ok(Json(json!({ "data": model })))
}
