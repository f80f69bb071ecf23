//! Order model, the central transactional entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle states
///
/// ```text
/// PENDING_PAYMENT ──► PAID ──► TICKETS_ISSUED
///        │
///        ├──► FAILED
///        ├──► EXPIRED
///        └──► CANCELLED
/// ```
///
/// PAID and TICKETS_ISSUED both count as "approved": a repeated approval
/// signal on either is a no-op, not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    PendingPayment,
    Paid,
    TicketsIssued,
    Failed,
    Expired,
    Cancelled,
}

impl OrderStatus {
    /// Whether the payment has been accepted (tickets issued or pending issuance)
    pub fn is_approved(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::TicketsIssued)
    }

    /// Whether the order can never be approved anymore
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            OrderStatus::Failed | OrderStatus::Expired | OrderStatus::Cancelled
        )
    }
}

/// Upper bound on combos per order; larger values are data-entry errors
pub const MAX_COMBOS_COUNT: u32 = 10_000;

/// Upper bound on cards per combo
pub const MAX_COMBO_SIZE: u32 = 1_000;

fn default_one() -> u32 {
    1
}

fn default_combo_size() -> u32 {
    6
}

/// An order for a bundle of cards
///
/// `amount`, `combos_count` and `combo_size` are snapshots taken at
/// creation/approval time; `total_cards = combos_count * combo_size` is
/// fixed once the order reaches PAID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,

    // === Buyer contact snapshot ===
    pub buyer_name: String,
    pub buyer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,

    // === Vendor attribution ===
    /// Raw code the buyer arrived with (vendor id or link token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,

    /// Requested card delivery format (e.g. "digital")
    #[serde(default)]
    pub format: String,
    /// Amount charged, in minor currency units (offer snapshot)
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub payment_method: String,
    /// Reference issued by the payment channel; webhook signals carry it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,

    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickets_issued_at: Option<DateTime<Utc>>,

    #[serde(default = "default_one")]
    pub combos_count: u32,
    #[serde(default = "default_combo_size")]
    pub combo_size: u32,

    /// One-shot flag: vendor ledger stats were already applied for this
    /// order. Checked before every ledger update so webhook retries never
    /// double-count.
    #[serde(default)]
    pub vendor_stats_applied: bool,
}

impl Order {
    /// Cards owed to the buyer once the order is approved
    ///
    /// Validation caps both factors well below overflow; saturate anyway
    /// so a hand-edited store file cannot panic the issuance path.
    pub fn total_cards(&self) -> u32 {
        self.combos_count.saturating_mul(self.combo_size)
    }
}

/// Maps a client-supplied idempotency key to the order it produced
///
/// Created once per key, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
}
