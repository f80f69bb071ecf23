//! Vendor resolution and the one-shot stats ledger

use crate::store::Document;
use rust_decimal::Decimal;

/// A vendor matched from a buyer-supplied code
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVendor {
    pub id: String,
    pub name: String,
    pub commission_pct: Decimal,
}

/// Resolve a vendor code against an event's ledger
///
/// The code matches either the vendor id or the vendor's link token,
/// whitespace-trimmed. Unknown codes resolve to None; the order is still
/// accepted, just without attribution.
pub fn resolve_vendor(doc: &Document, event_id: &str, code: &str) -> Option<ResolvedVendor> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    let state = doc.event_state(event_id)?;
    state.vendors.iter().find_map(|(id, vendor)| {
        let token_matches = vendor
            .link_token
            .as_deref()
            .map(str::trim)
            .map(|t| !t.is_empty() && t == code)
            .unwrap_or(false);
        if id == code || token_matches {
            Some(ResolvedVendor {
                id: id.clone(),
                name: vendor.display_name(id),
                commission_pct: vendor.commission_pct,
            })
        } else {
            None
        }
    })
}

/// Credit an order to its vendor's accumulators, at most once
///
/// Bumps cards (actual issued ticket count), combos, gross sales, and
/// commission, then sets the order's one-shot flag. Returns false without
/// touching anything when the order has no vendor, the vendor is missing
/// from the ledger, or the flag is already set.
pub fn apply_vendor_stats_once(doc: &mut Document, order_id: &str) -> bool {
    let Some(order) = doc.find_order(order_id) else {
        return false;
    };
    if order.vendor_stats_applied {
        return false;
    }
    let Some(vendor_id) = order.vendor_id.clone() else {
        return false;
    };
    let event_id = order.event_id.clone();
    let amount = order.amount;
    let combos = u64::from(order.combos_count);
    let cards = doc.ticket_count_for_order(order_id) as u64;

    let Some(vendor) = doc
        .event_state_mut(&event_id)
        .and_then(|state| state.vendors.get_mut(&vendor_id))
    else {
        tracing::warn!(order_id, vendor_id = %vendor_id, "Vendor missing from ledger; stats not applied");
        return false;
    };
    vendor.stats.cards += cards;
    vendor.stats.combos += combos;
    vendor.stats.gross_sales += amount;
    vendor.stats.commission += Decimal::from(amount) * vendor.commission_pct / Decimal::from(100);

    if let Some(order) = doc.find_order_mut(order_id) {
        order.vendor_stats_applied = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::{
        CardGrid, EventState, EventStateEntry, Order, OrderStatus, Ticket, Vendor,
    };

    fn vendor(name: &str, token: Option<&str>, pct: i64) -> Vendor {
        Vendor {
            name: Some(name.to_string()),
            link_token: token.map(str::to_string),
            commission_pct: Decimal::from(pct),
            ..Default::default()
        }
    }

    fn doc_with_vendor() -> Document {
        let mut doc = Document::seed();
        let mut state = EventState::default();
        state
            .vendors
            .insert("v-1".to_string(), vendor("Ana", Some("tok-ana"), 10));
        doc.event_states.insert(
            "E1".to_string(),
            EventStateEntry {
                state: Some(state),
                updated_at: Utc::now(),
            },
        );
        doc
    }

    fn order(id: &str, vendor_id: Option<&str>, amount: i64) -> Order {
        Order {
            id: id.to_string(),
            event_id: "E1".to_string(),
            offer_id: None,
            buyer_name: "Ana".to_string(),
            buyer_phone: "3001234567".to_string(),
            buyer_email: None,
            vendor_code: None,
            vendor_id: vendor_id.map(str::to_string),
            vendor_name: None,
            format: "digital".to_string(),
            amount,
            payment_method: "ONLINE".to_string(),
            payment_reference: None,
            payment_url: None,
            status: OrderStatus::Paid,
            created_at: Utc::now(),
            paid_at: None,
            expires_at: None,
            expired_at: None,
            failed_at: None,
            tickets_issued_at: None,
            combos_count: 2,
            combo_size: 6,
            vendor_stats_applied: false,
        }
    }

    fn ticket(order_id: &str, index: u32) -> Ticket {
        Ticket {
            id: format!("t-{}-{}", order_id, index),
            serial: format!("TB-E1-0000{}-AAAA", index),
            order_id: order_id.to_string(),
            event_id: "E1".to_string(),
            buyer_name: None,
            buyer_phone: None,
            buyer_email: None,
            vendor_id: None,
            vendor_name: None,
            card_index: index,
            grid: CardGrid {
                cols: [[0u8; 5]; 5],
            },
            signature: format!("[sig-{}-{}]", order_id, index),
            pdf_url: None,
            jpg_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_by_id_and_token() {
        let doc = doc_with_vendor();
        let by_id = resolve_vendor(&doc, "E1", "v-1").unwrap();
        assert_eq!(by_id.name, "Ana");
        let by_token = resolve_vendor(&doc, "E1", " tok-ana ").unwrap();
        assert_eq!(by_token.id, "v-1");
        assert!(resolve_vendor(&doc, "E1", "nobody").is_none());
        assert!(resolve_vendor(&doc, "E2", "v-1").is_none());
        assert!(resolve_vendor(&doc, "E1", "  ").is_none());
    }

    #[test]
    fn test_stats_applied_once() {
        let mut doc = doc_with_vendor();
        doc.orders.push(order("o-1", Some("v-1"), 12000));
        for i in 0..12 {
            doc.tickets.push(ticket("o-1", i));
        }

        assert!(apply_vendor_stats_once(&mut doc, "o-1"));
        // Second call is a no-op
        assert!(!apply_vendor_stats_once(&mut doc, "o-1"));

        let stats = &doc.event_state("E1").unwrap().vendors["v-1"].stats;
        assert_eq!(stats.cards, 12);
        assert_eq!(stats.combos, 2);
        assert_eq!(stats.gross_sales, 12000);
        assert_eq!(stats.commission, Decimal::from(1200));
        assert!(doc.find_order("o-1").unwrap().vendor_stats_applied);
    }

    #[test]
    fn test_no_vendor_means_no_ledger_write() {
        let mut doc = doc_with_vendor();
        doc.orders.push(order("o-2", None, 6000));
        assert!(!apply_vendor_stats_once(&mut doc, "o-2"));
        let stats = &doc.event_state("E1").unwrap().vendors["v-1"].stats;
        assert_eq!(stats.gross_sales, 0);
    }

    #[test]
    fn test_unknown_vendor_leaves_flag_clear() {
        let mut doc = doc_with_vendor();
        doc.orders.push(order("o-3", Some("v-gone"), 6000));
        assert!(!apply_vendor_stats_once(&mut doc, "o-3"));
        assert!(!doc.find_order("o-3").unwrap().vendor_stats_applied);
    }
}
