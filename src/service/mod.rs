//! Model lookup service — the three-tier read-through chain.
//!
//! Resolution order for both operations: memory cache → persistent store →
//! upstream API, with write-back into the tiers above whichever one
//! answered. Tier-local failures (cache deserialization, store reads,
//! best-effort write-backs) are logged and swallowed as long as a lower
//! tier can still satisfy the request; only the upstream tier's failure
//! propagates, upgraded to [`Error::SourceUnavailable`] when the store had
//! already failed on the same call.
//!
//! Collaborators are injected at construction (no ambient singletons), so
//! tests substitute fakes through [`ModelStore`] and [`ModelSource`].
//!
//! Concurrent cold misses on the same key may each reach upstream; the
//! stampede is accepted rather than deduplicated.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cache::{MemoryCache, key};
use crate::store::ModelStore;
use crate::telemetry;
use crate::types::Model;
use crate::upstream::ModelSource;
use crate::{Error, Result};

/// Orchestrates `fetch_all` / `fetch_by_id` across the three tiers.
pub struct ModelLookupService {
    cache: Arc<MemoryCache>,
    store: Arc<dyn ModelStore>,
    source: Arc<dyn ModelSource>,
}

impl ModelLookupService {
    /// Wire the service to its tiers. Each collaborator is constructed once
    /// per process at the composition root and shared.
    pub fn new(
        cache: Arc<MemoryCache>,
        store: Arc<dyn ModelStore>,
        source: Arc<dyn ModelSource>,
    ) -> Self {
        Self {
            cache,
            store,
            source,
        }
    }

    /// Resolve the full free-model collection.
    pub async fn fetch_all(&self) -> Result<Vec<Model>> {
        // Tier 1: memory cache.
        if let Some(models) = self.cache.get::<Vec<Model>>(key::COLLECTION_KEY) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => "fetch_all").increment(1);
            record_lookup("fetch_all", "memory", "ok");
            debug!(count = models.len(), "collection served from cache");
            return Ok(models);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => "fetch_all").increment(1);

        // Tier 2: persistent store. Errors fall through to upstream.
        let mut store_error = None;
        match self.store.get_all().await {
            Ok(models) if !models.is_empty() => {
                self.cache.set(key::COLLECTION_KEY, &models, None);
                record_lookup("fetch_all", "store", "ok");
                debug!(count = models.len(), "collection served from store");
                return Ok(models);
            }
            Ok(_) => debug!("store is empty, falling through to upstream"),
            Err(e) => {
                warn!(error = %e, "store read failed, falling through to upstream");
                metrics::counter!(telemetry::TIER_FALLTHROUGH_TOTAL,
                    "tier" => "store", "operation" => "fetch_all")
                .increment(1);
                store_error = Some(e);
            }
        }

        // Tier 3: upstream — the authoritative path; its errors propagate.
        let started = Instant::now();
        let models = match self.source.fetch_all().await {
            Ok(models) => models,
            Err(e) => {
                record_lookup("fetch_all", "upstream", "error");
                return Err(match store_error {
                    Some(store_err) => Error::SourceUnavailable(format!(
                        "store: {store_err}; upstream: {e}"
                    )),
                    None => e,
                });
            }
        };
        metrics::histogram!(telemetry::UPSTREAM_FETCH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        // Write back down the chain, best effort for the store.
        if let Err(e) = self.store.upsert_many(&models).await {
            warn!(error = %e, "store write-back failed");
            metrics::counter!(telemetry::TIER_FALLTHROUGH_TOTAL,
                "tier" => "store", "operation" => "write_back")
            .increment(1);
        }
        self.cache.set(key::COLLECTION_KEY, &models, None);

        record_lookup("fetch_all", "upstream", "ok");
        info!(count = models.len(), "collection refreshed from upstream");
        Ok(models)
    }

    /// Resolve a single model by id.
    ///
    /// A miss in cache and store resolves through the full `fetch_all`
    /// chain and scans its result; an id absent there is
    /// [`Error::ModelNotFound`].
    pub async fn fetch_by_id(&self, id: &str) -> Result<Model> {
        let point_key = key::model_key(id);

        if let Some(model) = self.cache.get::<Model>(&point_key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => "fetch_by_id")
                .increment(1);
            record_lookup("fetch_by_id", "memory", "ok");
            return Ok(model);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => "fetch_by_id").increment(1);

        match self.store.get_by_id(id).await {
            Ok(Some(model)) => {
                self.cache.set(&point_key, &model, None);
                record_lookup("fetch_by_id", "store", "ok");
                debug!(id, "model served from store");
                return Ok(model);
            }
            Ok(None) => debug!(id, "model not in store, falling through"),
            Err(e) => {
                warn!(id, error = %e, "store lookup failed, falling through");
                metrics::counter!(telemetry::TIER_FALLTHROUGH_TOTAL,
                    "tier" => "store", "operation" => "fetch_by_id")
                .increment(1);
            }
        }

        let models = self.fetch_all().await?;
        match models.into_iter().find(|m| m.id == id) {
            Some(model) => {
                // Point entry gets its own TTL, independent of the
                // collection entry's lifecycle.
                self.cache.set(&point_key, &model, None);
                record_lookup("fetch_by_id", "upstream", "ok");
                Ok(model)
            }
            None => {
                record_lookup("fetch_by_id", "upstream", "not_found");
                Err(Error::ModelNotFound(id.to_string()))
            }
        }
    }
}

fn record_lookup(operation: &'static str, tier: &'static str, status: &'static str) {
    metrics::counter!(telemetry::LOOKUPS_TOTAL,
        "operation" => operation, "tier" => tier, "status" => status)
    .increment(1);
}
