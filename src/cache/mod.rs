//! In-memory cache tier.
//!
//! [`MemoryCache`] is the first stage of the lookup chain: a bounded,
//! TTL-expiring key→JSON-payload store with hit/miss accounting. Values are
//! serialized on `set` and deserialized on `get`, so a cached value read
//! back is structurally identical to what was stored until it expires or is
//! deleted.
//!
//! # Architecture
//!
//! - moka-backed bounded cache (TinyLFU admission, approximately LRU
//!   eviction) capped at [`CacheConfig::max_entries`] resident entries.
//! - Per-entry TTL via moka's `Expiry` hook; the process-wide default
//!   (300 s) applies when a `set` omits the TTL.
//! - Expired entries are invisible to `get`/`has`/`keys` the moment they
//!   lapse; physical purging happens lazily and on the daemon's periodic
//!   [`MemoryCache::run_pending_tasks`] sweep, with no correctness
//!   dependency on that interval.
//!
//! # Stats
//!
//! `stats()` reports global hit/miss counters and a best-effort byte-size
//! estimate (sum of serialized value lengths). Per-entry hit/miss fields are
//! reported as zero — the admin API shape carries them, but per-key
//! accounting is not implemented.

pub mod key;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Default TTL applied when `set` is called without one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of resident entries.
pub const DEFAULT_MAX_ENTRIES: u64 = 1_000;

/// Interval at which the daemon drives lazy purging of expired entries.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the in-memory cache tier.
///
/// ```rust
/// # use modelrelay::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(2_000)
///     .default_ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum resident entries. Default: 1,000.
    pub max_entries: u64,
    /// TTL applied when a `set` omits one. Default: 300 s.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of resident entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the default TTL.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// A stored payload plus its expiry bookkeeping.
#[derive(Clone, Debug)]
struct CacheEntry {
    payload: Arc<serde_json::Value>,
    ttl: Duration,
    size_bytes: u64,
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Reads each entry's own TTL instead of a cache-wide time-to-live.
struct EntryTtl;

impl moka::Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite restarts the clock with the new entry's TTL.
        Some(value.ttl)
    }
}

/// Aggregate cache statistics, served verbatim by the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: u64,
    /// Sum of serialized value lengths; an approximation, not authoritative.
    pub estimated_bytes: u64,
    /// `hits / (hits + misses)`, or 0 when nothing has been accessed yet.
    pub hit_ratio: f64,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub entries: Vec<CacheEntryStats>,
}

/// Per-entry statistics line.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStats {
    pub key: String,
    pub size_bytes: u64,
    /// Always zero: per-key hit accounting is not implemented.
    pub hits: u64,
    /// Always zero: per-key miss accounting is not implemented.
    pub misses: u64,
    pub last_set: DateTime<Utc>,
}

/// Bounded, TTL-expiring in-memory key→JSON store with hit/miss accounting.
///
/// Thread-safe; moka handles concurrent access internally. No operation
/// panics or returns an error under normal conditions — `set` reports
/// failure through its boolean result instead.
pub struct MemoryCache {
    entries: moka::sync::Cache<String, CacheEntry>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl MemoryCache {
    /// Create a cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = moka::sync::Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(EntryTtl)
            .build();
        Self {
            entries,
            default_ttl: config.default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    /// Look up a value.
    ///
    /// Increments the hit counter on presence and the miss counter on
    /// absence (including expired entries). A payload that no longer
    /// deserializes as `T` is treated as a miss rather than an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) => match serde_json::from_value(entry.payload.as_ref().clone()) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "cached payload failed to deserialize");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value, overwriting any existing entry unconditionally.
    ///
    /// `ttl` must be positive; `None` applies the process-wide default.
    /// Returns `false` (never panics) when the TTL is invalid or the value
    /// cannot be serialized.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.is_zero() {
            warn!(key, "rejected cache set with zero TTL");
            return false;
        }

        let payload = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "value not serializable, cache set skipped");
                return false;
            }
        };
        // Best-effort size estimate; a value that survived to_value always
        // re-serializes, but degrade to 0 rather than fail if it somehow
        // doesn't.
        let size_bytes = serde_json::to_string(&payload)
            .map(|s| s.len() as u64)
            .unwrap_or(0);

        let stored_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|delta| stored_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload: Arc::new(payload),
                ttl,
                size_bytes,
                stored_at,
                expires_at,
            },
        );
        self.sets.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Remove one entry. Returns `true` iff a live entry existed.
    pub fn delete(&self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    /// Remove all entries unconditionally. Always succeeds; calling it on an
    /// empty cache is a no-op.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Whether a live entry exists for `key`. Does not touch the hit/miss
    /// counters.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All live (non-expired) keys, in unspecified order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.run_pending_tasks();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(k, _)| k.as_ref().clone())
            .collect()
    }

    /// Snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();

        let mut entries = Vec::new();
        let mut estimated_bytes = 0u64;
        for (k, entry) in self.entries.iter() {
            if entry.is_expired() {
                continue;
            }
            estimated_bytes += entry.size_bytes;
            entries.push(CacheEntryStats {
                key: k.as_ref().clone(),
                size_bytes: entry.size_bytes,
                hits: 0,
                misses: 0,
                last_set: entry.stored_at,
            });
        }

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let accesses = hits + misses;
        let hit_ratio = if accesses > 0 {
            hits as f64 / accesses as f64
        } else {
            0.0
        };

        CacheStats {
            total_entries: entries.len() as u64,
            estimated_bytes,
            hit_ratio,
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Drive moka's housekeeping (physical purge of expired/evicted
    /// entries). Called by the daemon's periodic sweep; correctness never
    /// depends on it because expiry is also checked at access time.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = MemoryCache::default();
        assert!(cache.set("k", &vec!["a", "b"], None));
        let back: Option<Vec<String>> = cache.get("k");
        assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn get_on_unset_key_counts_one_miss() {
        let cache = MemoryCache::default();
        let missing: Option<String> = cache.get("nope");
        assert!(missing.is_none());

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn has_does_not_touch_counters() {
        let cache = MemoryCache::default();
        cache.set("k", &1u32, None);
        assert!(cache.has("k"));
        assert!(!cache.has("other"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = MemoryCache::default();
        cache.set("k", &"v", Some(Duration::from_millis(20)));
        assert!(cache.has("k"));

        std::thread::sleep(Duration::from_millis(60));

        assert!(!cache.has("k"));
        let gone: Option<String> = cache.get("k");
        assert!(gone.is_none());
        assert!(!cache.keys().contains(&"k".to_string()));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let cache = MemoryCache::default();
        assert!(!cache.set("k", &"v", Some(Duration::ZERO)));
        assert!(!cache.has("k"));
    }

    #[test]
    fn overwrite_replaces_value() {
        let cache = MemoryCache::default();
        cache.set("k", &"old", None);
        cache.set("k", &"new", None);
        let back: Option<String> = cache.get("k");
        assert_eq!(back.as_deref(), Some("new"));
    }

    #[test]
    fn delete_reports_presence() {
        let cache = MemoryCache::default();
        cache.set("k", &"v", None);
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
    }

    #[test]
    fn clear_is_idempotent() {
        let cache = MemoryCache::default();
        cache.set("a", &1u32, None);
        cache.set("b", &2u32, None);

        cache.clear();
        let gone: Option<u32> = cache.get("a");
        assert!(gone.is_none());

        // Second clear is safe.
        cache.clear();
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn keys_lists_live_entries() {
        let cache = MemoryCache::default();
        cache.set("a", &1u32, None);
        cache.set("b", &2u32, None);

        let mut keys = cache.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn stats_reports_hit_ratio() {
        let cache = MemoryCache::default();
        assert_eq!(cache.stats().hit_ratio, 0.0);

        cache.set("k", &"v", None);
        let _: Option<String> = cache.get("k");
        let _: Option<String> = cache.get("absent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.total_entries, 1);
        assert!(stats.estimated_bytes > 0);
    }

    #[test]
    fn per_entry_stats_are_placeholders() {
        let cache = MemoryCache::default();
        cache.set("k", &"v", None);
        let _: Option<String> = cache.get("k");

        let stats = cache.stats();
        assert_eq!(stats.entries.len(), 1);
        assert_eq!(stats.entries[0].hits, 0);
        assert_eq!(stats.entries[0].misses, 0);
    }
}
