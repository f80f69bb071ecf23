//! Order lifecycle manager
//!
//! Owns every transition of the order state machine. Each operation runs
//! the JIT expiry sweep inside its own store transaction, so no separate
//! timer is needed to keep deadlines honest.

use crate::core::{Config, PaymentMode};
use crate::orders::expiry;
use crate::orders::requests::{CreateOrderRequest, ManualOrderRequest};
use crate::payments::{PaymentChannel, PaymentOutcome, PaymentSignal};
use crate::store::{IdempotencyClaim, Store};
use crate::tickets::{ledger, TicketIssuer, TicketRenderer};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Order, OrderStatus, Ticket};
use shared::{AppError, AppResult};
use std::sync::Arc;
use uuid::Uuid;

/// What the buyer gets back after creating an order
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub status: OrderStatus,
    pub amount: i64,
    pub payment_reference: Option<String>,
    pub payment_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// True when an idempotency key replayed an earlier order
    pub idempotent: bool,
}

/// Result of a manual (admin) order creation
#[derive(Debug, Clone, Serialize)]
pub struct ManualOrderReceipt {
    pub order_id: String,
    pub status: OrderStatus,
    pub issued_cards: Option<u32>,
}

/// Result of applying a payment signal
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationOutcome {
    pub order_id: String,
    pub status: OrderStatus,
    /// True when the signal was a duplicate of one already applied
    pub idempotent: bool,
    pub issued_cards: Option<u32>,
}

/// An order together with its issued cards, sorted by card index
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithTickets {
    pub order: Order,
    pub tickets: Vec<Ticket>,
}

/// Buyer-facing order search ("my orders")
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSearch {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub event_id: Option<String>,
}

/// Sanitized order view returned by searches
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: String,
    pub event_id: String,
    pub buyer_name: String,
    pub status: OrderStatus,
    pub amount: i64,
    pub format: String,
    pub payment_method: String,
    pub combos_count: u32,
    pub combo_size: u32,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct OrdersManager {
    store: Store,
    payments: Arc<dyn PaymentChannel>,
    issuer: TicketIssuer,
    config: Config,
}

impl OrdersManager {
    pub fn new(
        store: Store,
        payments: Arc<dyn PaymentChannel>,
        renderer: Arc<dyn TicketRenderer>,
        config: Config,
    ) -> Self {
        let issuer = TicketIssuer::new(store.clone(), renderer, config.issuance_retry_multiplier);
        Self {
            store,
            payments,
            issuer,
            config,
        }
    }

    fn ttl(&self) -> Duration {
        Duration::minutes(self.config.pending_ttl_minutes)
    }

    // ==================== Creation ====================

    /// Create a buyer order against an event offer
    ///
    /// With an idempotency key, a retry of the same request returns the
    /// original order instead of charging twice.
    pub async fn create_order(&self, req: CreateOrderRequest) -> AppResult<OrderReceipt> {
        req.validate()?;
        let now = Utc::now();
        let mut txn = self.store.begin().await?;
        expiry::expire_pending(txn.doc_mut(), now, self.ttl());

        // Insert-if-absent is the only claim path: a taken key surfaces
        // the winner's receipt, a won claim rides along with the new order
        // and is discarded with the transaction on any later error.
        let order_id = Uuid::new_v4().to_string();
        let idem_key = req
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        if let Some(key) = idem_key.as_deref() {
            if let IdempotencyClaim::Existing(record) =
                txn.doc_mut().claim_idempotency(key, &order_id, now)
            {
                match txn.doc().find_order(&record.order_id) {
                    Some(prev) => {
                        let receipt = OrderReceipt {
                            order_id: prev.id.clone(),
                            status: prev.status,
                            amount: prev.amount,
                            payment_reference: prev.payment_reference.clone(),
                            payment_url: prev.payment_url.clone(),
                            expires_at: prev.expires_at,
                            idempotent: true,
                        };
                        txn.commit()?;
                        tracing::info!(
                            order_id = %receipt.order_id,
                            "Idempotency key replayed an existing order"
                        );
                        return Ok(receipt);
                    }
                    None => {
                        // Stale mapping (e.g. a store restored from a
                        // quarantine backup); reclaim the key
                        txn.doc_mut().idempotency.remove(key);
                        txn.doc_mut().claim_idempotency(key, &order_id, now);
                    }
                }
            }
        }

        let (event_id, combo_size) = {
            let event = txn.doc().find_event(&req.event_id).ok_or_else(|| {
                AppError::not_found("Event").with_detail("event_id", req.event_id.clone())
            })?;
            (event.id.clone(), event.combo_size)
        };
        let (offer_id, amount, combos_count) = {
            let offer = txn.doc().find_offer(&req.offer_id, &req.event_id).ok_or_else(|| {
                AppError::invalid_request("Offer does not belong to this event")
                    .with_detail("offer_id", req.offer_id.clone())
                    .with_detail("event_id", req.event_id.clone())
            })?;
            (offer.id.clone(), offer.price, offer.combos_count)
        };

        let vendor_code = req
            .vendor_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let vendor = vendor_code
            .as_deref()
            .and_then(|code| ledger::resolve_vendor(txn.doc(), &event_id, code));

        let intent = self
            .payments
            .create_payment(&order_id, amount, req.buyer_phone.trim());

        let format = if req.format.trim().is_empty() {
            "digital".to_string()
        } else {
            req.format.trim().to_string()
        };
        let expires_at = Some(now + self.ttl());
        txn.doc_mut().orders.push(Order {
            id: order_id.clone(),
            event_id: event_id.clone(),
            offer_id: Some(offer_id),
            buyer_name: req.buyer_name.trim().to_string(),
            buyer_phone: req.buyer_phone.trim().to_string(),
            buyer_email: req
                .buyer_email
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            vendor_code,
            vendor_id: vendor.as_ref().map(|v| v.id.clone()),
            vendor_name: vendor.as_ref().map(|v| v.name.clone()),
            format,
            amount,
            payment_method: "ONLINE".to_string(),
            payment_reference: Some(intent.reference.clone()),
            payment_url: intent.payment_url.clone(),
            status: OrderStatus::PendingPayment,
            created_at: now,
            paid_at: None,
            expires_at,
            expired_at: None,
            failed_at: None,
            tickets_issued_at: None,
            combos_count,
            combo_size,
            vendor_stats_applied: false,
        });
        txn.commit()?;

        tracing::info!(order_id = %order_id, event_id = %event_id, amount, "Order created");
        Ok(OrderReceipt {
            order_id,
            status: OrderStatus::PendingPayment,
            amount,
            payment_reference: Some(intent.reference),
            payment_url: intent.payment_url,
            expires_at,
            idempotent: false,
        })
    }

    /// Create an order at a physical point of sale
    ///
    /// No offer is involved; amount and sizing come from the request with
    /// event defaults as fallback. In SIMULATED payment mode the order is
    /// approved and issued immediately.
    pub async fn create_manual_order(&self, req: ManualOrderRequest) -> AppResult<ManualOrderReceipt> {
        req.validate()?;
        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        {
            let mut txn = self.store.begin().await?;
            expiry::expire_pending(txn.doc_mut(), now, self.ttl());

            let event = txn.doc().find_event(&req.event_id);
            let event_id = event
                .map(|e| e.id.clone())
                .unwrap_or_else(|| req.event_id.trim().to_string());
            let combo_size = req
                .combo_size
                .or(event.map(|e| e.combo_size))
                .unwrap_or(6);
            let combos_count = req.combos_count.unwrap_or(1);
            let amount = req.amount.unwrap_or(0);

            let vendor_code = req
                .vendor_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            let vendor = vendor_code
                .as_deref()
                .and_then(|code| ledger::resolve_vendor(txn.doc(), &event_id, code));

            let intent = self
                .payments
                .create_payment(&order_id, amount, req.buyer_phone.trim());
            let format = if req.format.trim().is_empty() {
                "physical".to_string()
            } else {
                req.format.trim().to_string()
            };
            txn.doc_mut().orders.push(Order {
                id: order_id.clone(),
                event_id: event_id.clone(),
                offer_id: None,
                buyer_name: req.buyer_name.trim().to_string(),
                buyer_phone: req.buyer_phone.trim().to_string(),
                buyer_email: req
                    .buyer_email
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                vendor_code,
                vendor_id: vendor.as_ref().map(|v| v.id.clone()),
                vendor_name: vendor.as_ref().map(|v| v.name.clone()),
                format,
                amount,
                payment_method: req
                    .payment_method
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("MANUAL")
                    .to_string(),
                payment_reference: Some(intent.reference),
                payment_url: intent.payment_url,
                status: OrderStatus::PendingPayment,
                created_at: now,
                paid_at: None,
                expires_at: Some(now + self.ttl()),
                expired_at: None,
                failed_at: None,
                tickets_issued_at: None,
                combos_count,
                combo_size,
                vendor_stats_applied: false,
            });
            txn.commit()?;
            tracing::info!(order_id = %order_id, event_id = %event_id, "Manual order created");
        }

        if self.config.payment_mode == PaymentMode::Simulated {
            let outcome = self.approve_order(&order_id).await?;
            return Ok(ManualOrderReceipt {
                order_id,
                status: outcome.status,
                issued_cards: outcome.issued_cards,
            });
        }
        Ok(ManualOrderReceipt {
            order_id,
            status: OrderStatus::PendingPayment,
            issued_cards: None,
        })
    }

    // ==================== Confirmation ====================

    /// Apply a confirmation or rejection signal from the payment channel
    pub async fn apply_payment_signal(&self, signal: PaymentSignal) -> AppResult<ConfirmationOutcome> {
        let order_id = self.resolve_reference(&signal.reference).await?;
        match signal.outcome {
            PaymentOutcome::Approved => self.approve_order(&order_id).await,
            PaymentOutcome::Rejected => self.reject_order(&order_id).await,
        }
    }

    /// Approve an order directly by id (admin "mark paid")
    pub async fn mark_paid(&self, order_id: &str) -> AppResult<OrderWithTickets> {
        self.approve_order(order_id).await?;
        self.get_order(order_id).await
    }

    async fn resolve_reference(&self, reference: &str) -> AppResult<String> {
        let doc = self.store.snapshot().await?;
        doc.find_order_by_reference(reference)
            .map(|o| o.id.clone())
            .ok_or_else(|| {
                AppError::not_found("Order").with_detail("reference", reference.to_string())
            })
    }

    /// Shared approval routine for signals, manual orders and mark-paid
    ///
    /// Duplicate approvals are no-ops; an EXPIRED order is a conflict; an
    /// issuance failure leaves the order PAID so the next signal retries.
    async fn approve_order(&self, order_id: &str) -> AppResult<ConfirmationOutcome> {
        let now = Utc::now();
        let already_approved;
        {
            let mut txn = self.store.begin().await?;
            expiry::expire_pending(txn.doc_mut(), now, self.ttl());

            let (status, offer_id, event_id) = {
                let order = txn
                    .doc()
                    .find_order(order_id)
                    .ok_or_else(|| AppError::order_not_found(order_id))?;
                (order.status, order.offer_id.clone(), order.event_id.clone())
            };
            if status == OrderStatus::Expired {
                // The sweep above may have just expired it; keep that result
                txn.commit()?;
                return Err(AppError::order_expired(order_id));
            }
            already_approved = status.is_approved();
            if !already_approved {
                // Re-snapshot sizing from the offer and event at approval time
                let combos = offer_id
                    .as_deref()
                    .and_then(|oid| txn.doc().find_offer(oid, &event_id))
                    .map(|o| o.combos_count);
                let size = txn.doc().find_event(&event_id).map(|e| e.combo_size);
                if let Some(order) = txn.doc_mut().find_order_mut(order_id) {
                    if let Some(combos) = combos {
                        order.combos_count = combos;
                    }
                    if let Some(size) = size {
                        order.combo_size = size;
                    }
                    order.status = OrderStatus::Paid;
                    order.paid_at = Some(now);
                }
                tracing::info!(order_id, "Order marked PAID");
            }
            txn.commit()?;
        }

        match self.issuer.issue(order_id).await {
            Ok(report) => {
                let mut txn = self.store.begin().await?;
                if let Some(order) = txn.doc_mut().find_order_mut(order_id) {
                    if order.status == OrderStatus::Paid {
                        order.status = OrderStatus::TicketsIssued;
                        order.tickets_issued_at = Some(Utc::now());
                    }
                }
                txn.commit()?;
                Ok(ConfirmationOutcome {
                    order_id: order_id.to_string(),
                    status: OrderStatus::TicketsIssued,
                    idempotent: already_approved,
                    issued_cards: Some(report.cards),
                })
            }
            Err(err) => {
                // The order stays PAID; the next approval signal retries
                tracing::error!(order_id, error = %err, "Ticket issuance failed");
                Ok(ConfirmationOutcome {
                    order_id: order_id.to_string(),
                    status: OrderStatus::Paid,
                    idempotent: already_approved,
                    issued_cards: None,
                })
            }
        }
    }

    /// Rejection only fails an order still waiting for payment
    async fn reject_order(&self, order_id: &str) -> AppResult<ConfirmationOutcome> {
        let now = Utc::now();
        let mut txn = self.store.begin().await?;
        expiry::expire_pending(txn.doc_mut(), now, self.ttl());

        let mut was_pending = false;
        let status = {
            let order = txn
                .doc_mut()
                .find_order_mut(order_id)
                .ok_or_else(|| AppError::order_not_found(order_id))?;
            if order.status == OrderStatus::PendingPayment {
                order.status = OrderStatus::Failed;
                order.failed_at = Some(now);
                was_pending = true;
            }
            order.status
        };
        txn.commit()?;

        if was_pending {
            tracing::info!(order_id, "Order failed by payment rejection");
        } else {
            tracing::debug!(order_id, status = ?status, "Rejection ignored for non-pending order");
        }
        Ok(ConfirmationOutcome {
            order_id: order_id.to_string(),
            status,
            idempotent: !was_pending,
            issued_cards: None,
        })
    }

    // ==================== Queries & maintenance ====================

    /// Fetch one order with its cards
    pub async fn get_order(&self, order_id: &str) -> AppResult<OrderWithTickets> {
        let mut txn = self.store.begin().await?;
        expiry::expire_pending(txn.doc_mut(), Utc::now(), self.ttl());
        let order = txn
            .doc()
            .find_order(order_id)
            .cloned()
            .ok_or_else(|| AppError::order_not_found(order_id))?;
        let tickets = txn.doc().tickets_for_order(order_id);
        txn.commit()?;
        Ok(OrderWithTickets { order, tickets })
    }

    /// Buyer-facing search by contact details, newest first
    pub async fn search_orders(&self, query: &OrderSearch) -> AppResult<Vec<OrderSummary>> {
        let phone = query.phone.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let email = query
            .email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase);
        if phone.is_none() && email.is_none() {
            return Err(AppError::invalid_request("phone or email is required"));
        }
        let event_id = query.event_id.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut txn = self.store.begin().await?;
        expiry::expire_pending(txn.doc_mut(), Utc::now(), self.ttl());
        let mut matches: Vec<OrderSummary> = txn
            .doc()
            .orders
            .iter()
            .filter(|o| phone.map_or(true, |p| o.buyer_phone.trim() == p))
            .filter(|o| {
                email.as_deref().map_or(true, |e| {
                    o.buyer_email
                        .as_deref()
                        .map(|oe| oe.trim().eq_ignore_ascii_case(e))
                        .unwrap_or(false)
                })
            })
            .filter(|o| event_id.map_or(true, |e| o.event_id.eq_ignore_ascii_case(e)))
            .map(|o| OrderSummary {
                id: o.id.clone(),
                event_id: o.event_id.clone(),
                buyer_name: o.buyer_name.clone(),
                status: o.status,
                amount: o.amount,
                format: o.format.clone(),
                payment_method: o.payment_method.clone(),
                combos_count: o.combos_count,
                combo_size: o.combo_size,
                created_at: o.created_at,
                paid_at: o.paid_at,
                expires_at: o.expires_at,
            })
            .collect();
        txn.commit()?;
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    /// Run the expiry sweep on its own (maintenance entry point)
    pub async fn expire_pending_orders(&self) -> AppResult<usize> {
        let mut txn = self.store.begin().await?;
        let expired = expiry::expire_pending(txn.doc_mut(), Utc::now(), self.ttl());
        txn.commit()?;
        if expired > 0 {
            tracing::info!(expired, "Expiry sweep flipped pending orders");
        }
        Ok(expired)
    }
}
