//! Telemetry metric name constants.
//!
//! Centralised metric names for modelrelay operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `modelrelay_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `operation` — lookup invoked: "fetch_all" or "fetch_by_id"
//! - `tier` — chain stage that answered: "memory" | "store" | "upstream"
//! - `status` — outcome: "ok" or "error"

/// Total lookups resolved by the lookup service.
///
/// Labels: `operation`, `tier` (tier that satisfied the request), `status`.
pub const LOOKUPS_TOTAL: &str = "modelrelay_lookups_total";

/// Total memory-cache hits observed by the lookup service.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "modelrelay_cache_hits_total";

/// Total memory-cache misses observed by the lookup service.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "modelrelay_cache_misses_total";

/// Total tier-local failures that were swallowed because a lower tier could
/// still answer (persistent-tier reads, best-effort write-backs).
///
/// Labels: `tier`, `operation`.
pub const TIER_FALLTHROUGH_TOTAL: &str = "modelrelay_tier_fallthrough_total";

/// Upstream fetch duration in seconds, successful fetches only.
pub const UPSTREAM_FETCH_DURATION_SECONDS: &str = "modelrelay_upstream_fetch_duration_seconds";
