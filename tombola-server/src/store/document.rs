//! The persisted document and its lookup helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{
    Event, EventState, EventStateEntry, IdempotencyRecord, Offer, Order, Ticket,
};
use std::collections::{HashMap, HashSet};

/// The whole database as one serializable value
///
/// Every field defaults so that partially-populated or older files still
/// load. The store owns all durable state; in-memory copies handed out
/// during a transaction are transient until committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// Idempotency map: client key -> order it produced
    #[serde(default)]
    pub idempotency: HashMap<String, IdempotencyRecord>,
    /// Per-event mutable panel state (vendor ledger lives here)
    #[serde(default)]
    pub event_states: HashMap<String, EventStateEntry>,
    /// Per-event monotonic serial sequence; advances only on commit
    #[serde(default)]
    pub event_ticket_seq: HashMap<String, u64>,
}

/// Outcome of an insert-if-absent idempotency claim
#[derive(Debug, Clone, PartialEq)]
pub enum IdempotencyClaim {
    /// The key was free and now maps to the given order
    Claimed,
    /// The key was already taken; the winning record is returned
    Existing(IdempotencyRecord),
}

impl Document {
    /// Fresh empty document, used for seeding and self-heal
    pub fn seed() -> Self {
        Self::default()
    }

    // ==================== Events & offers ====================

    /// Case-insensitive event lookup
    pub fn find_event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.matches_id(event_id))
    }

    pub fn find_event_mut(&mut self, event_id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.matches_id(event_id))
    }

    /// Offer lookup scoped to an event; returns None when the offer
    /// exists but belongs to a different event
    pub fn find_offer(&self, offer_id: &str, event_id: &str) -> Option<&Offer> {
        self.offers
            .iter()
            .find(|o| o.id == offer_id && o.event_id.eq_ignore_ascii_case(event_id))
    }

    pub fn offers_for_event(&self, event_id: &str) -> Vec<&Offer> {
        self.offers
            .iter()
            .filter(|o| o.event_id.eq_ignore_ascii_case(event_id))
            .collect()
    }

    // ==================== Orders ====================

    pub fn find_order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn find_order_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == order_id)
    }

    /// Order lookup by the reference the payment channel issued
    pub fn find_order_by_reference(&self, reference: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|o| o.payment_reference.as_deref() == Some(reference))
    }

    // ==================== Tickets ====================

    /// Tickets of one order, sorted by card index
    pub fn tickets_for_order(&self, order_id: &str) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.card_index);
        tickets
    }

    pub fn ticket_count_for_order(&self, order_id: &str) -> usize {
        self.tickets.iter().filter(|t| t.order_id == order_id).count()
    }

    /// All grid signatures already used within an event, across orders
    pub fn signatures_for_event(&self, event_id: &str) -> HashSet<String> {
        self.tickets
            .iter()
            .filter(|t| t.event_id.eq_ignore_ascii_case(event_id))
            .map(|t| t.signature.clone())
            .collect()
    }

    // ==================== Idempotency ====================

    pub fn idempotency_record(&self, key: &str) -> Option<&IdempotencyRecord> {
        self.idempotency.get(key)
    }

    /// Insert-if-absent claim of an idempotency key
    ///
    /// Returns the winning record when the key was already mapped; the
    /// caller must then surface the winner's order instead of its own.
    pub fn claim_idempotency(
        &mut self,
        key: &str,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> IdempotencyClaim {
        if let Some(existing) = self.idempotency.get(key) {
            return IdempotencyClaim::Existing(existing.clone());
        }
        self.idempotency.insert(
            key.to_string(),
            IdempotencyRecord {
                order_id: order_id.to_string(),
                created_at: now,
            },
        );
        IdempotencyClaim::Claimed
    }

    // ==================== Event state ====================

    pub fn event_state(&self, event_id: &str) -> Option<&EventState> {
        self.event_states
            .get(event_id)
            .and_then(|entry| entry.state.as_ref())
    }

    pub fn event_state_mut(&mut self, event_id: &str) -> Option<&mut EventState> {
        self.event_states
            .get_mut(event_id)
            .and_then(|entry| entry.state.as_mut())
    }
}
