//! Offer model

use serde::{Deserialize, Serialize};

fn default_combos_count() -> u32 {
    1
}

/// A purchasable bundle of combos for one event
///
/// Orders snapshot `price` and `combos_count` at creation time; an offer
/// is never re-read once an order references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_combos_count")]
    pub combos_count: u32,
    /// Bundle price in minor currency units
    #[serde(default)]
    pub price: i64,
}
