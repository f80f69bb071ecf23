//! Just-in-time expiry sweep
//!
//! There is no background timer; the sweep runs inside the transaction of
//! any operation that touches orders. Pending orders without a deadline
//! (created before deadlines existed) get one backfilled instead of being
//! expired retroactively.

use crate::store::Document;
use chrono::{DateTime, Duration, Utc};
use shared::models::OrderStatus;

/// Expire overdue PENDING_PAYMENT orders in place
///
/// Returns how many orders flipped to EXPIRED. Backfilled deadlines count
/// as document mutations but not as expiries.
pub fn expire_pending(doc: &mut Document, now: DateTime<Utc>, ttl: Duration) -> usize {
    let mut expired = 0;
    for order in &mut doc.orders {
        if order.status != OrderStatus::PendingPayment {
            continue;
        }
        match order.expires_at {
            None => {
                order.expires_at = Some(order.created_at + ttl);
            }
            Some(deadline) if deadline <= now => {
                order.status = OrderStatus::Expired;
                order.expired_at = Some(now);
                expired += 1;
                tracing::debug!(order_id = %order.id, "Order expired");
            }
            Some(_) => {}
        }
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Order;

    fn pending(id: &str, created_minutes_ago: i64, expires_at: Option<DateTime<Utc>>) -> Order {
        let created_at = Utc::now() - Duration::minutes(created_minutes_ago);
        Order {
            id: id.to_string(),
            event_id: "E1".to_string(),
            offer_id: None,
            buyer_name: "Ana".to_string(),
            buyer_phone: "3001234567".to_string(),
            buyer_email: None,
            vendor_code: None,
            vendor_id: None,
            vendor_name: None,
            format: "digital".to_string(),
            amount: 6000,
            payment_method: "ONLINE".to_string(),
            payment_reference: None,
            payment_url: None,
            status: OrderStatus::PendingPayment,
            created_at,
            paid_at: None,
            expires_at,
            expired_at: None,
            failed_at: None,
            tickets_issued_at: None,
            combos_count: 1,
            combo_size: 6,
            vendor_stats_applied: false,
        }
    }

    #[test]
    fn test_overdue_pending_expires() {
        let mut doc = Document::seed();
        let now = Utc::now();
        doc.orders
            .push(pending("o-old", 60, Some(now - Duration::minutes(30))));
        doc.orders
            .push(pending("o-fresh", 1, Some(now + Duration::minutes(29))));

        let expired = expire_pending(&mut doc, now, Duration::minutes(30));
        assert_eq!(expired, 1);
        assert_eq!(doc.find_order("o-old").unwrap().status, OrderStatus::Expired);
        assert!(doc.find_order("o-old").unwrap().expired_at.is_some());
        assert_eq!(
            doc.find_order("o-fresh").unwrap().status,
            OrderStatus::PendingPayment
        );
    }

    #[test]
    fn test_missing_deadline_backfilled_not_expired() {
        let mut doc = Document::seed();
        let now = Utc::now();
        // Created 2 hours ago with no deadline: gets one, stays pending
        doc.orders.push(pending("o-legacy", 120, None));

        let expired = expire_pending(&mut doc, now, Duration::minutes(30));
        assert_eq!(expired, 0);
        let order = doc.find_order("o-legacy").unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        let deadline = order.expires_at.unwrap();
        assert_eq!(deadline, order.created_at + Duration::minutes(30));

        // The next sweep then expires it normally
        let expired = expire_pending(&mut doc, now, Duration::minutes(30));
        assert_eq!(expired, 1);
    }

    #[test]
    fn test_non_pending_orders_untouched() {
        let mut doc = Document::seed();
        let now = Utc::now();
        let mut paid = pending("o-paid", 120, Some(now - Duration::minutes(60)));
        paid.status = OrderStatus::Paid;
        doc.orders.push(paid);

        assert_eq!(expire_pending(&mut doc, now, Duration::minutes(30)), 0);
        assert_eq!(doc.find_order("o-paid").unwrap().status, OrderStatus::Paid);
    }
}
