//! modelrelay — free-tier OpenRouter model catalogue with tiered caching.
//!
//! Every lookup resolves through a three-tier read-through chain: an
//! in-memory cache, a Postgres-backed persistent store, and the upstream
//! OpenRouter listing API (free-filtered), with write-back into the tiers
//! above whichever one answered. Tier-local failures degrade gracefully; a
//! transient database outage is invisible to clients as long as cache or
//! upstream can answer.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use modelrelay::cache::MemoryCache;
//! use modelrelay::config::Config;
//! use modelrelay::service::ModelLookupService;
//! use modelrelay::store::PgModelStore;
//! use modelrelay::upstream::OpenRouterSource;
//!
//! #[tokio::main]
//! async fn main() -> modelrelay::Result<()> {
//!     let config = Config::load(None)?;
//!
//!     let cache = Arc::new(MemoryCache::new(&config.cache.tier_config()));
//!     let store = Arc::new(PgModelStore::new(config.database.clone()));
//!     let source = Arc::new(OpenRouterSource::new(&config.upstream)?);
//!     let service = ModelLookupService::new(cache, store, source);
//!
//!     let models = service.fetch_all().await?;
//!     println!("{} free models", models.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod upstream;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use service::ModelLookupService;
pub use types::{Model, Pricing};
