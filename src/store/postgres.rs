//! PostgreSQL implementation of the persistent tier.
//!
//! The pool is established lazily on first use so the cache→upstream
//! fallback keeps working when the database is absent: a missing connection
//! URL only becomes a [`Error::Configuration`] failure on the code path that
//! actually needs persistence, and the health probe reports it as unhealthy
//! instead of failing.
//!
//! Every query runs under the configured query timeout; a hung database
//! surfaces as a typed persistence failure rather than stalling the lookup
//! chain. Schema bootstrap happens once at connect time.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{ModelStore, StoreHealth};
use crate::config::{DatabaseConfig, SslMode};
use crate::types::{Model, Pricing};
use crate::{Error, Result};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ai_models (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT,
    context_length  BIGINT,
    created_at      TIMESTAMPTZ,
    fetched_at      TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const UPSERT: &str = r#"
INSERT INTO ai_models (id, name, description, context_length, created_at, fetched_at)
VALUES ($1, $2, $3, $4, $5, now())
ON CONFLICT (id) DO UPDATE SET
    name = EXCLUDED.name,
    description = EXCLUDED.description,
    context_length = EXCLUDED.context_length,
    created_at = EXCLUDED.created_at,
    fetched_at = now()
"#;

const SELECT_ALL: &str = r#"
SELECT id, name, description, context_length, created_at
FROM ai_models
ORDER BY created_at DESC NULLS LAST, id ASC
"#;

const SELECT_BY_ID: &str = r#"
SELECT id, name, description, context_length, created_at
FROM ai_models
WHERE id = $1
"#;

/// Row shape for catalogue queries. Pricing is not persisted — only free
/// models are ever written, so rows rehydrate with zero pricing.
#[derive(sqlx::FromRow)]
struct ModelRow {
    id: String,
    name: String,
    description: Option<String>,
    context_length: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

impl From<ModelRow> for Model {
    fn from(row: ModelRow) -> Self {
        Model {
            id: row.id,
            name: row.name,
            description: row.description,
            context_length: row.context_length.and_then(|v| u32::try_from(v).ok()),
            pricing: Pricing::free(),
            created_at: row.created_at,
        }
    }
}

/// sqlx-backed [`ModelStore`] with a lazily established connection pool.
pub struct PgModelStore {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl PgModelStore {
    /// Create the adapter without touching the network; the pool connects on
    /// first use.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let url = self.config.url.as_deref().ok_or_else(|| {
                    Error::Configuration(
                        "database URL is not configured (set DATABASE_URL or [database].url)"
                            .to_string(),
                    )
                })?;
                let options: PgConnectOptions = url.parse().map_err(|e| {
                    Error::Configuration(format!("invalid database URL: {e}"))
                })?;
                let options = options.ssl_mode(pg_ssl_mode(self.config.ssl_mode));

                let pool = PgPoolOptions::new()
                    .max_connections(self.config.bounded_max_connections())
                    .acquire_timeout(self.config.connect_timeout())
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        Error::PersistenceRead(format!("database connection failed: {e}"))
                    })?;

                sqlx::query(CREATE_TABLE)
                    .execute(&pool)
                    .await
                    .map_err(|e| {
                        Error::PersistenceWrite(format!("schema bootstrap failed: {e}"))
                    })?;

                info!(
                    max_connections = self.config.bounded_max_connections(),
                    "database pool established"
                );
                Ok(pool)
            })
            .await
    }

    /// Bound a query future by the configured timeout, mapping both timeout
    /// and failure into the given error constructor.
    async fn bounded<T, F>(
        &self,
        operation: &str,
        make_err: fn(String) -> Error,
        fut: F,
    ) -> Result<T>
    where
        F: Future<Output = sqlx::Result<T>>,
    {
        match tokio::time::timeout(self.config.query_timeout(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(make_err(format!("{operation} failed: {e}"))),
            Err(_) => Err(make_err(format!(
                "{operation} timed out after {:?}",
                self.config.query_timeout()
            ))),
        }
    }
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Require => PgSslMode::Require,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Disable => PgSslMode::Disable,
    }
}

#[async_trait]
impl ModelStore for PgModelStore {
    async fn upsert_many(&self, models: &[Model]) -> Result<()> {
        if models.is_empty() {
            return Ok(());
        }
        let pool = self.pool().await?;

        // One transaction for the whole batch; a timeout or mid-batch error
        // drops the transaction, which rolls everything back.
        self.bounded("model upsert", Error::PersistenceWrite, async {
            let mut tx = pool.begin().await?;
            for model in models {
                sqlx::query(UPSERT)
                    .bind(&model.id)
                    .bind(&model.name)
                    .bind(&model.description)
                    .bind(model.context_length.map(i64::from))
                    .bind(model.created_at)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await
        })
        .await?;

        debug!(count = models.len(), "stored models in database");
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Model>> {
        let pool = self.pool().await?;
        let rows: Vec<ModelRow> = self
            .bounded("model scan", Error::PersistenceRead, async {
                sqlx::query_as(SELECT_ALL).fetch_all(pool).await
            })
            .await?;
        Ok(rows.into_iter().map(Model::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Model>> {
        let pool = self.pool().await?;
        let row: Option<ModelRow> = self
            .bounded("model lookup", Error::PersistenceRead, async {
                sqlx::query_as(SELECT_BY_ID).bind(id).fetch_optional(pool).await
            })
            .await?;
        Ok(row.map(Model::from))
    }

    async fn clear(&self) -> Result<()> {
        let pool = self.pool().await?;
        self.bounded("model clear", Error::PersistenceWrite, async {
            sqlx::query("DELETE FROM ai_models").execute(pool).await
        })
        .await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreHealth {
        let pool = match self.pool().await {
            Ok(pool) => pool,
            Err(e) => return StoreHealth::unhealthy(e.to_string()),
        };
        match self
            .bounded("health probe", Error::PersistenceRead, async {
                sqlx::query("SELECT 1").execute(pool).await
            })
            .await
        {
            Ok(_) => StoreHealth::healthy(),
            Err(e) => StoreHealth::unhealthy(e.to_string()),
        }
    }
}
