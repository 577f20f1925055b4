//! In-process router tests: endpoint shapes, error envelope, and the
//! bearer gate on the cache-admin surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use modelrelay::cache::{key, CacheConfig, MemoryCache};
use modelrelay::http::{router, AppState};
use modelrelay::store::{ModelStore, StoreHealth};
use modelrelay::types::{Model, Pricing};
use modelrelay::upstream::ModelSource;
use modelrelay::{Error, ModelLookupService, Result};

fn model(id: &str) -> Model {
    Model {
        id: id.to_string(),
        name: format!("Model {id}"),
        description: None,
        context_length: Some(4096),
        pricing: Pricing::free(),
        created_at: None,
    }
}

/// Store fake: empty and healthy unless told otherwise.
struct StubStore {
    healthy: bool,
}

#[async_trait]
impl ModelStore for StubStore {
    async fn upsert_many(&self, _models: &[Model]) -> Result<()> {
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Model>> {
        Ok(Vec::new())
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<Model>> {
        Ok(None)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> StoreHealth {
        if self.healthy {
            StoreHealth::healthy()
        } else {
            StoreHealth::unhealthy("stub outage")
        }
    }
}

struct StubSource {
    models: Vec<Model>,
    fail: bool,
}

#[async_trait]
impl ModelSource for StubSource {
    async fn fetch_all(&self) -> Result<Vec<Model>> {
        if self.fail {
            return Err(Error::UpstreamFetch("stub upstream down".to_string()));
        }
        Ok(self.models.clone())
    }
}

fn app_with(source: StubSource, store_healthy: bool) -> (Router, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new(&CacheConfig::new()));
    let store = Arc::new(StubStore {
        healthy: store_healthy,
    });
    let service = Arc::new(ModelLookupService::new(
        cache.clone(),
        store.clone(),
        Arc::new(source),
    ));
    let app = router(AppState {
        service,
        cache: cache.clone(),
        store,
    });
    (app, cache)
}

fn app() -> (Router, Arc<MemoryCache>) {
    app_with(
        StubSource {
            models: vec![model("m1")],
            fail: false,
        },
        true,
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_models_returns_data_envelope() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/api/models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], "m1");
}

#[tokio::test]
async fn get_model_by_id() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/api/models/m1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], "m1");
}

#[tokio::test]
async fn unknown_model_maps_to_404_envelope() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::get("/api/models/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "not_found");
    assert_eq!(json["error"]["message"], "Model not found");
}

#[tokio::test]
async fn tier_exhaustion_maps_to_500_envelope() {
    let (app, _) = app_with(
        StubSource {
            models: Vec::new(),
            fail: true,
        },
        true,
    );

    let response = app
        .oneshot(Request::get("/api/models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "api_error");
}

#[tokio::test]
async fn cache_stats_requires_bearer_token() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/api/cache/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cache_stats_returns_tier_shape() {
    let (app, cache) = app();
    cache.set("warm", &"value", None);

    let response = app
        .oneshot(
            Request::get("/api/cache/stats")
                .header(header::AUTHORIZATION, "Bearer any-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total_entries"], 1);
    assert!(json["hit_ratio"].is_number());
    assert_eq!(json["entries"][0]["key"], "warm");
}

#[tokio::test]
async fn invalidate_single_key() {
    let (app, cache) = app();
    cache.set(key::COLLECTION_KEY, &vec![model("m1")], None);

    let response = app
        .oneshot(
            Request::post("/api/cache/invalidate")
                .header(header::AUTHORIZATION, "Bearer any-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"key": "models"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["invalidated_keys"], serde_json::json!(["models"]));
    assert!(!cache.has(key::COLLECTION_KEY));
}

#[tokio::test]
async fn invalidate_without_key_clears_everything() {
    let (app, cache) = app();
    cache.set("a", &1u32, None);
    cache.set("b", &2u32, None);

    let response = app
        .oneshot(
            Request::post("/api/cache/invalidate")
                .header(header::AUTHORIZATION, "Bearer any-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let mut keys: Vec<String> = json["invalidated_keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    assert!(cache.keys().is_empty());
}

#[tokio::test]
async fn invalidate_requires_bearer_token() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::post("/api/cache/invalidate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_ok_with_healthy_store() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"]["healthy"], true);
}

#[tokio::test]
async fn health_degrades_when_store_is_down() {
    let (app, _) = app_with(
        StubSource {
            models: vec![model("m1")],
            fail: false,
        },
        false,
    );

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Degraded, not failing: the cache→upstream fallback still serves.
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["database"]["healthy"], false);
}
