//! Ticket issuance coordinator
//!
//! Turns a PAID order into its batch of cards inside one store
//! transaction: grids are drawn until the batch is collision-free within
//! the event, serials are assigned from the per-event sequence, the
//! vendor ledger is credited, and everything commits together. A failure
//! anywhere before commit leaves the store untouched.

use crate::store::{Store, StoreError};
use crate::tickets::files::{TicketArtifacts, TicketRenderer};
use crate::tickets::{grid, ledger, serial};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::models::Ticket;
use shared::{AppError, ErrorCode};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The attempt budget ran out before the batch was collision-free.
    /// Nothing was persisted; the event's signature space is effectively
    /// exhausted at its current density.
    #[error("Signature space exhausted for order {order_id}: {issued}/{requested} cards after {attempts} attempts")]
    Exhausted {
        order_id: String,
        requested: u32,
        issued: u32,
        attempts: u32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::OrderNotFound(id) => AppError::order_not_found(&id),
            IssuanceError::Exhausted {
                ref order_id,
                requested,
                issued,
                attempts,
            } => AppError::new(ErrorCode::IssuanceExhausted)
                .with_detail("order_id", order_id.clone())
                .with_detail("requested", requested)
                .with_detail("issued", issued)
                .with_detail("attempts", attempts),
            IssuanceError::Store(store) => store.into(),
        }
    }
}

/// What a (possibly idempotent) issuance produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceReport {
    /// Cards now held by the order
    pub cards: u32,
    /// True when the order already had its tickets and nothing new was minted
    pub idempotent: bool,
}

/// Issues card batches for approved orders
pub struct TicketIssuer {
    store: Store,
    renderer: Arc<dyn TicketRenderer>,
    /// Attempt budget per batch: `total_cards * retry_multiplier`
    retry_multiplier: u32,
}

impl TicketIssuer {
    pub fn new(store: Store, renderer: Arc<dyn TicketRenderer>, retry_multiplier: u32) -> Self {
        Self {
            store,
            renderer,
            retry_multiplier,
        }
    }

    /// Issue the order's full card batch, or return the existing one
    pub async fn issue(&self, order_id: &str) -> Result<IssuanceReport, IssuanceError> {
        let mut rng = StdRng::from_entropy();
        self.issue_with_rng(order_id, &mut rng).await
    }

    /// Issuance with a caller-supplied RNG
    ///
    /// The RNG drives grid candidates and serial suffixes; tests seed it
    /// to make collision behavior reproducible.
    pub async fn issue_with_rng<R: Rng + Send + ?Sized>(
        &self,
        order_id: &str,
        rng: &mut R,
    ) -> Result<IssuanceReport, IssuanceError> {
        let mut txn = self.store.begin().await?;
        let order = txn
            .doc()
            .find_order(order_id)
            .cloned()
            .ok_or_else(|| IssuanceError::OrderNotFound(order_id.to_string()))?;

        // Idempotent path: tickets exist already. Still make sure the
        // vendor ledger got its one-shot credit (a crash between the two
        // writes on an older deployment can leave it behind).
        let existing = txn.doc().ticket_count_for_order(order_id);
        if existing > 0 {
            if ledger::apply_vendor_stats_once(txn.doc_mut(), order_id) {
                txn.commit()?;
            }
            tracing::info!(
                order_id,
                cards = existing,
                "Order already has tickets; issuance is a no-op"
            );
            return Ok(IssuanceReport {
                cards: existing as u32,
                idempotent: true,
            });
        }

        let total = order.total_cards();
        let budget = total.saturating_mul(self.retry_multiplier);
        let mut used = txn.doc().signatures_for_event(&order.event_id);
        let mut seq = txn
            .doc()
            .event_ticket_seq
            .get(&order.event_id)
            .copied()
            .unwrap_or(0);
        let now = Utc::now();

        let mut batch: Vec<Ticket> = Vec::with_capacity(total as usize);
        let mut attempts = 0u32;
        while (batch.len() as u32) < total && attempts < budget {
            attempts += 1;
            let grid = grid::random_grid(rng);
            let signature = grid.signature();
            if used.contains(&signature) {
                continue;
            }
            seq += 1;
            let card_index = batch.len() as u32;
            let serial = serial::make_serial(&order.event_id, seq, rng);
            let artifacts = match self
                .renderer
                .prepare(&order.event_id, &order, card_index, &grid)
                .await
            {
                Ok(artifacts) => artifacts,
                Err(err) => {
                    tracing::warn!(
                        order_id,
                        card_index,
                        error = %err,
                        "Card artifact preparation failed; issuing without artifacts"
                    );
                    TicketArtifacts::default()
                }
            };
            batch.push(Ticket {
                id: Uuid::new_v4().to_string(),
                serial,
                order_id: order.id.clone(),
                event_id: order.event_id.clone(),
                buyer_name: Some(order.buyer_name.clone()),
                buyer_phone: Some(order.buyer_phone.clone()),
                buyer_email: order.buyer_email.clone(),
                vendor_id: order.vendor_id.clone(),
                vendor_name: order.vendor_name.clone(),
                card_index,
                grid,
                signature: signature.clone(),
                pdf_url: artifacts.pdf_url,
                jpg_url: artifacts.jpg_url,
                created_at: now,
            });
            used.insert(signature);
        }

        let issued = batch.len() as u32;
        if issued < total {
            // Dropping the transaction discards the partial batch and the
            // advanced sequence.
            tracing::error!(
                order_id,
                event_id = %order.event_id,
                requested = total,
                issued,
                attempts,
                "Could not draw enough unique grids; aborting issuance"
            );
            return Err(IssuanceError::Exhausted {
                order_id: order_id.to_string(),
                requested: total,
                issued,
                attempts,
            });
        }

        let doc = txn.doc_mut();
        doc.tickets.extend(batch);
        doc.event_ticket_seq.insert(order.event_id.clone(), seq);
        ledger::apply_vendor_stats_once(doc, order_id);
        txn.commit()?;

        tracing::info!(
            order_id,
            event_id = %order.event_id,
            cards = issued,
            "Issued ticket batch"
        );
        Ok(IssuanceReport {
            cards: issued,
            idempotent: false,
        })
    }
}
