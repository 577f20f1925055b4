//! Cache key derivation.
//!
//! Maps a logical query to the string key addressing its cache entry. Total
//! over any id string: ids are treated as opaque and appended after a fixed
//! `model:` prefix, so a point key can never collide with the collection key
//! (which contains no separator) or with another id's key.

/// Key under which the full free-model collection is cached.
pub const COLLECTION_KEY: &str = "models";

/// Prefix for single-model entries.
const MODEL_KEY_PREFIX: &str = "model:";

/// Key for a single model's cache entry.
pub fn model_key(id: &str) -> String {
    format!("{MODEL_KEY_PREFIX}{id}")
}
