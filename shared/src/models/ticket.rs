//! Ticket (card) model and grid representation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel value for the free center cell
pub const FREE_CELL: u8 = 0;

/// A 5x5 card grid stored column-first
///
/// Each column holds 5 sorted values from its fixed band; the center cell
/// of the middle column is the free sentinel 0. Serializes transparently
/// as a nested array, matching the persisted document format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CardGrid {
    pub cols: [[u8; 5]; 5],
}

impl CardGrid {
    /// Canonical serialization of all 25 cells, column-major
    ///
    /// Used as the uniqueness key within an event. Reproducible from
    /// identical grid contents; never used for replay.
    pub fn signature(&self) -> String {
        let cells: Vec<String> = self
            .cols
            .iter()
            .flat_map(|col| col.iter())
            .map(|v| v.to_string())
            .collect();
        format!("[{}]", cells.join(","))
    }

    /// The center cell (free on every well-formed grid)
    pub fn center(&self) -> u8 {
        self.cols[2][2]
    }
}

/// One physical card belonging to exactly one order and one event
///
/// Immutable once created; only referenced by reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    /// Human-readable serial printed on the card
    pub serial: String,
    pub order_id: String,
    pub event_id: String,

    // === Buyer/vendor snapshot, denormalized from the order at issuance ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,

    /// 0-based position within the order; contiguous `[0, total_cards)`
    pub card_index: u32,
    pub grid: CardGrid,
    /// Canonical grid serialization; unique within the event
    pub signature: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpg_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
