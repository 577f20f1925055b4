//! Persistent tier: durable second-level cache keyed by model id.
//!
//! [`ModelStore`] is the seam between the lookup service and whatever holds
//! the durable copy of the catalogue. Production uses
//! [`PgModelStore`](postgres::PgModelStore); tests substitute in-memory
//! fakes through the same trait.

pub mod postgres;

pub use postgres::PgModelStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;
use crate::types::Model;

/// Outcome of a store health probe. Never an error: connectivity failure is
/// reported as `healthy = false` with a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub healthy: bool,
    /// Diagnostic detail when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl StoreHealth {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            detail: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
            checked_at: Utc::now(),
        }
    }
}

/// Durable key→record store used as the chain's second-level cache.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Insert or overwrite records by id, atomically as one batch. On
    /// conflict the mutable fields (`name`, `description`, `context_length`,
    /// `created_at`) are overwritten; the fetch timestamp is stamped by the
    /// store itself. A mid-batch failure rolls the whole batch back and
    /// surfaces [`Error::PersistenceWrite`](crate::Error::PersistenceWrite).
    async fn upsert_many(&self, models: &[Model]) -> Result<()>;

    /// All records, newest `created_at` first (missing timestamps sort
    /// last). An empty store yields an empty vec, not an error.
    async fn get_all(&self) -> Result<Vec<Model>>;

    /// Point lookup by id; absence is `Ok(None)`, not an error.
    async fn get_by_id(&self, id: &str) -> Result<Option<Model>>;

    /// Remove all records unconditionally.
    async fn clear(&self) -> Result<()>;

    /// Probe connectivity. Must not error.
    async fn health_check(&self) -> StoreHealth;
}
