//! modelrelay error types

/// modelrelay error types.
///
/// The lookup chain distinguishes tier-local failures (persistence read/write,
/// swallowed by the orchestrator while a lower tier can still answer) from
/// terminal ones (upstream fetch, exhaustion of every tier). The HTTP layer
/// maps these to status codes; this enum only needs to keep the kinds apart.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration is missing or malformed. Fatal for the code
    /// path that needs it (e.g. no database URL at lazy-connect time).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The persistent tier failed to answer a query.
    #[error("persistence read error: {0}")]
    PersistenceRead(String),

    /// The persistent tier failed to apply a write; the batch was rolled back.
    #[error("persistence write error: {0}")]
    PersistenceWrite(String),

    /// The upstream listing API could not be reached or returned a failure.
    #[error("upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// No model with the requested id exists after the full chain resolved.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Every tier failed for a collection lookup.
    #[error("all sources unavailable: {0}")]
    SourceUnavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for modelrelay operations
pub type Result<T> = std::result::Result<T, Error>;
