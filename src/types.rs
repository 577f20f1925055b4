//! Domain types for the model catalogue.
//!
//! [`Model`] is the unit of data moved through every tier of the lookup
//! chain. It is serde round-trippable so the in-memory cache can store it as
//! a JSON payload and hand back a structurally identical value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single catalogue entry, keyed by its upstream `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Stable identifier from the upstream source; primary key in every tier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Token budget, used for sort/filter by consumers.
    #[serde(default)]
    pub context_length: Option<u32>,
    /// Per-token prices. Everything this service stores is free tier, so
    /// records rehydrated from the persistent tier carry zero pricing.
    #[serde(default)]
    pub pricing: Pricing,
    /// Upstream creation timestamp; nullable in persistent storage.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Prompt/completion unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    pub prompt: f64,
    pub completion: f64,
}

impl Pricing {
    /// Zero pricing — the only value that survives the free filter.
    pub fn free() -> Self {
        Self::default()
    }

    /// A model is free iff both unit prices are exactly zero.
    pub fn is_free(&self) -> bool {
        self.prompt == 0.0 && self.completion == 0.0
    }
}

/// A price as the upstream API encodes it: either a JSON number or a
/// numeric string (OpenRouter sends decimal strings like `"0.000005"`).
///
/// The loose zero comparison in the free filter is intentional: `"0"` and
/// `0` both normalize to zero. Unparseable text normalizes to `None` and is
/// treated as non-free.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    /// Normalize to a number; `None` when the text form does not parse.
    pub fn normalize(&self) -> Option<f64> {
        match self {
            RawPrice::Number(n) => Some(*n),
            RawPrice::Text(s) => s.trim().parse().ok(),
        }
    }
}
