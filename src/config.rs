//! Configuration loading for modelrelayd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.modelrelay/config.toml` (user)
//! 3. `/etc/modelrelay/config.toml` (system)
//!
//! When no file exists the defaults apply. Deployment secrets and connection
//! targets come from the environment as a fallback for values the file does
//! not set: `OPENROUTER_API_KEY`, `DATABASE_URL`, `DB_SSL`,
//! `DB_MAX_CONNECTIONS`, `MODELRELAY_ADDR`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::{Error, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheSection,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Upstream listing API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the listing API (default: OpenRouter v1).
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Bearer credential. Falls back to `OPENROUTER_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_key: None,
            timeout_secs: default_upstream_timeout(),
        }
    }
}

fn default_upstream_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_upstream_timeout() -> u64 {
    10
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// SSL mode for the persistent tier connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Require,
    #[default]
    Prefer,
    Disable,
}

impl SslMode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "require" => Some(SslMode::Require),
            "prefer" => Some(SslMode::Prefer),
            "disable" => Some(SslMode::Disable),
            _ => None,
        }
    }
}

/// Persistent tier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. Falls back to `DATABASE_URL`; absence is only fatal
    /// on code paths that actually need persistence.
    #[serde(default)]
    pub url: Option<String>,
    /// Pool size, clamped to 1–50 (default: 10).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub ssl_mode: SslMode,
    /// Connect/acquire timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Per-query timeout in seconds (default: 10).
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            ssl_mode: SslMode::default(),
            connect_timeout_secs: default_connect_timeout(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_query_timeout() -> u64 {
    10
}

impl DatabaseConfig {
    /// Pool size bounded to the supported 1–50 range.
    pub fn bounded_max_connections(&self) -> u32 {
        self.max_connections.clamp(1, 50)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// In-memory cache tier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Default entry TTL in seconds (default: 300).
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
    /// Maximum resident entries (default: 1,000).
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: u64,
    /// Expired-entry sweep interval in seconds (default: 60).
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_max_entries() -> u64 {
    1_000
}

fn default_purge_interval() -> u64 {
    60
}

impl CacheSection {
    pub fn tier_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.max_entries)
            .default_ttl(Duration::from_secs(self.default_ttl_secs))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

impl Config {
    /// Load configuration from the standard locations and apply the
    /// environment overlay.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.modelrelay/config.toml`
    /// 3. `/etc/modelrelay/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Configuration(format!("failed to read config file {path:?}: {e}"))
                })?;
                toml::from_str(&content).map_err(|e| {
                    Error::Configuration(format!("failed to parse config file {path:?}: {e}"))
                })?
            }
            None => Config::default(),
        };
        config.overlay_env();
        Ok(config)
    }

    /// Resolve the config file path; `None` means "use defaults".
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(Error::Configuration(format!(
                "config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".modelrelay").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/modelrelay/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Fill gaps from the environment. File values win; the environment is a
    /// fallback, matching how deployment platforms inject secrets.
    pub fn overlay_env(&mut self) {
        if self.upstream.api_key.is_none() {
            self.upstream.api_key = std::env::var("OPENROUTER_API_KEY").ok();
        }
        if self.database.url.is_none() {
            self.database.url = std::env::var("DATABASE_URL").ok();
        }
        if let Ok(ssl) = std::env::var("DB_SSL") {
            if let Some(mode) = SslMode::parse(&ssl) {
                self.database.ssl_mode = mode;
            }
        }
        if let Ok(max) = std::env::var("DB_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse() {
                self.database.max_connections = n;
            }
        }
        if let Ok(addr) = std::env::var("MODELRELAY_ADDR") {
            self.server.address = addr;
        }
    }
}
