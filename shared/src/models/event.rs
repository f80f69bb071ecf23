//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_combo_size() -> u32 {
    6
}

fn default_true() -> bool {
    true
}

/// A timed card-sale event
///
/// Events are created and mutated by admins and never deleted. Event ids
/// compare case-insensitively; lookups must go through [`Event::matches_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Scheduled date/time shown on the landing page
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flyer_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Cards per combo unit
    #[serde(default = "default_combo_size")]
    pub combo_size: u32,
    /// Price of a single card, in minor currency units
    #[serde(default)]
    pub price_card: i64,
    /// Price of one combo, in minor currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_combo: Option<i64>,
    /// Explicit sales target (takes precedence over `auto_target_cards`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cards: Option<u32>,
    /// Auto-computed target, possibly left over from older versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_target_cards: Option<u32>,
    /// When the draw/call starts; sales auto-lock shortly before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_at: Option<DateTime<Utc>>,
    /// Manual sales lock toggled from the admin panel
    #[serde(default)]
    pub sales_locked: bool,
}

impl Event {
    /// Case-insensitive id comparison
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }

    /// Effective sales target: explicit target wins over the auto value
    pub fn effective_target_cards(&self) -> Option<u32> {
        self.target_cards.or(self.auto_target_cards)
    }

    /// Minimal new event with defaults, as created on first admin write
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            date_time: None,
            location: None,
            description: None,
            flyer_url: None,
            is_active: true,
            combo_size: default_combo_size(),
            price_card: 0,
            price_combo: None,
            target_cards: None,
            auto_target_cards: None,
            draw_at: None,
            sales_locked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_match_is_case_insensitive() {
        let ev = Event::new("FRIDAY");
        assert!(ev.matches_id("friday"));
        assert!(ev.matches_id("Friday"));
        assert!(!ev.matches_id("saturday"));
    }

    #[test]
    fn test_explicit_target_wins() {
        let mut ev = Event::new("E1");
        ev.auto_target_cards = Some(500);
        assert_eq!(ev.effective_target_cards(), Some(500));
        ev.target_cards = Some(300);
        assert_eq!(ev.effective_target_cards(), Some(300));
    }

    #[test]
    fn test_deserialize_minimal() {
        let ev: Event = serde_json::from_str(r#"{"id":"E1"}"#).unwrap();
        assert_eq!(ev.combo_size, 6);
        assert!(ev.is_active);
        assert!(!ev.sales_locked);
    }
}
