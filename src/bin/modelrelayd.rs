//! modelrelayd — model catalogue daemon.
//!
//! Serves the free-tier model catalogue over REST, backed by the
//! three-tier lookup chain (memory cache → Postgres → OpenRouter).

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use modelrelay::cache::MemoryCache;
use modelrelay::config::Config;
use modelrelay::http::{self, AppState};
use modelrelay::service::ModelLookupService;
use modelrelay::store::PgModelStore;
use modelrelay::upstream::OpenRouterSource;

/// modelrelay daemon — free-tier model catalogue service.
#[derive(Parser)]
#[command(name = "modelrelayd")]
#[command(version)]
#[command(about = "Free-tier model catalogue daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    if config.upstream.api_key.is_none() {
        warn!("no upstream API key configured (OPENROUTER_API_KEY); upstream calls will be unauthenticated");
    }
    if config.database.url.is_none() {
        warn!("no database URL configured (DATABASE_URL); persistent tier will report unhealthy");
    }

    // Composition root: each tier is constructed once and injected.
    let cache = Arc::new(MemoryCache::new(&config.cache.tier_config()));
    let store = Arc::new(PgModelStore::new(config.database.clone()));
    let source = Arc::new(OpenRouterSource::new(&config.upstream)?);
    let service = Arc::new(ModelLookupService::new(
        cache.clone(),
        store.clone(),
        source,
    ));

    spawn_purge_task(cache.clone(), config.cache.purge_interval());

    let addr: SocketAddr = config.server.address.parse().map_err(|e| {
        modelrelay::Error::Configuration(format!("invalid server address: {e}"))
    })?;

    let app = http::router(AppState {
        service,
        cache,
        store,
    });

    info!(version = env!("CARGO_PKG_VERSION"), %addr, "modelrelayd starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically drive the cache's housekeeping. Correctness never depends
/// on this interval; it only bounds how long expired entries stay resident.
fn spawn_purge_task(cache: Arc<MemoryCache>, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            cache.run_pending_tasks();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
