//! Per-event mutable state: vendor ledger and panel data
//!
//! The admin panel owns an opaque per-event state object; the engine only
//! understands two islands inside it: the vendor ledger and the generated
//! card log. Everything else round-trips untouched via `serde(flatten)`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Per-vendor accumulators, mutated at most once per order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VendorStats {
    #[serde(default)]
    pub cards: u64,
    #[serde(default)]
    pub combos: u64,
    /// Gross sales in minor currency units
    #[serde(default)]
    pub gross_sales: i64,
    /// Accumulated commission (`amount * commission_pct / 100` per order)
    #[serde(default)]
    pub commission: Decimal,
}

/// A vendor selling on behalf of an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Token embedded in the vendor's shared link; resolves like the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_token: Option<String>,
    #[serde(default)]
    pub commission_pct: Decimal,
    #[serde(default)]
    pub stats: VendorStats,
    /// Panel-owned fields we do not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vendor {
    /// Display name, falling back to the vendor id
    pub fn display_name(&self, id: &str) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(id)
            .to_string()
    }
}

/// One entry of the panel's generated-card log
///
/// Two historical formats coexist: bare primitive ids (legacy) and tagged
/// objects carrying issue metadata. Reporting treats the distinction as
/// best-effort only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedCard {
    Card(GeneratedCardMeta),
    Legacy(Value),
}

/// Object-format generated entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedCardMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The engine-visible slice of per-event panel state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventState {
    #[serde(default)]
    pub vendors: HashMap<String, Vendor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated: Vec<GeneratedCard>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-event state with its last-write stamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStateEntry {
    pub state: Option<EventState>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_dual_format_deserializes() {
        let json = r#"[ 17, "abc", {"id":"t-1","order_id":"o-1"}, {"source":"ONLINE"} ]"#;
        let entries: Vec<GeneratedCard> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], GeneratedCard::Legacy(_)));
        assert!(matches!(entries[1], GeneratedCard::Legacy(_)));
        match &entries[2] {
            GeneratedCard::Card(meta) => assert_eq!(meta.order_id.as_deref(), Some("o-1")),
            _ => panic!("expected object entry"),
        }
        match &entries[3] {
            GeneratedCard::Card(meta) => assert_eq!(meta.source.as_deref(), Some("ONLINE")),
            _ => panic!("expected object entry"),
        }
    }

    #[test]
    fn test_event_state_preserves_unknown_fields() {
        let json = r#"{"vendors":{},"panel_theme":{"bg":"red"},"notes":"hi"}"#;
        let state: EventState = serde_json::from_str(json).unwrap();
        assert_eq!(state.extra.get("notes").unwrap(), "hi");
        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["panel_theme"]["bg"], "red");
    }

    #[test]
    fn test_vendor_display_name_fallback() {
        let v = Vendor::default();
        assert_eq!(v.display_name("v-1"), "v-1");
        let named = Vendor {
            name: Some("  Ana  ".to_string()),
            ..Default::default()
        };
        assert_eq!(named.display_name("v-1"), "Ana");
    }

    #[test]
    fn test_vendor_stats_default_is_zero() {
        let stats = VendorStats::default();
        assert_eq!(stats.cards, 0);
        assert_eq!(stats.commission, Decimal::ZERO);
    }
}
