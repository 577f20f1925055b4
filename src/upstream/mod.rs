//! Upstream source adapter.
//!
//! [`OpenRouterSource`] fetches the authoritative model listing from the
//! OpenRouter API (`GET {base}/models`, bearer-authenticated) and applies
//! the free-tier filter: a record survives iff its prompt and completion
//! prices both normalize to zero. OpenRouter encodes prices as decimal
//! strings, so the filter accepts string and numeric zeros alike.
//!
//! Stateless — one network round-trip per call, no caching, no internal
//! retries. Retry policy, if any, belongs to the caller.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::types::{Model, Pricing, RawPrice};
use crate::{Error, Result};

/// Authoritative source at the bottom of the lookup chain.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Fetch the full dataset and apply the free filter.
    async fn fetch_all(&self) -> Result<Vec<Model>>;
}

/// OpenRouter `/models` list response.
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

/// A single model entry as the upstream API encodes it.
#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    context_length: Option<u32>,
    #[serde(default)]
    pricing: Option<PricingEntry>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PricingEntry {
    #[serde(default)]
    prompt: Option<RawPrice>,
    #[serde(default)]
    completion: Option<RawPrice>,
}

impl ModelEntry {
    /// The free predicate: pricing present and both prices normalize to
    /// exactly zero. Unparseable prices are treated as non-free.
    fn is_free(&self) -> bool {
        let Some(pricing) = &self.pricing else {
            return false;
        };
        matches!(
            (
                pricing.prompt.as_ref().and_then(RawPrice::normalize),
                pricing.completion.as_ref().and_then(RawPrice::normalize),
            ),
            (Some(p), Some(c)) if p == 0.0 && c == 0.0
        )
    }
}

impl From<ModelEntry> for Model {
    fn from(entry: ModelEntry) -> Self {
        let name = entry.name.unwrap_or_else(|| entry.id.clone());
        Model {
            id: entry.id,
            name,
            description: entry.description,
            context_length: entry.context_length,
            pricing: Pricing::free(),
            created_at: entry
                .created
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
        }
    }
}

/// Fetches the model listing from the OpenRouter API.
pub struct OpenRouterSource {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouterSource {
    /// Build a source from configuration. The request timeout is baked into
    /// the shared HTTP client so no call can hang unbounded.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ModelSource for OpenRouterSource {
    async fn fetch_all(&self) -> Result<Vec<Model>> {
        let url = format!("{}/models", self.base_url);
        let mut request = self.http_client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::UpstreamFetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamFetch(format!(
                "upstream returned HTTP {status}"
            )));
        }

        let listing: ModelsResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamFetch(format!("failed to decode listing: {e}")))?;

        let total = listing.data.len();
        let free: Vec<Model> = listing
            .data
            .into_iter()
            .filter(ModelEntry::is_free)
            .map(Model::from)
            .collect();
        debug!(total, free = free.len(), "fetched upstream model listing");
        Ok(free)
    }
}
