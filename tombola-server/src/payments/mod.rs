//! Payment channel collaborator
//!
//! The payment provider is a black box to the engine: it hands back a
//! reference (and optionally a checkout url) when an order is created,
//! and later sends a [`PaymentSignal`] carrying that reference. Transport
//! and signature verification live outside this crate.

use serde::{Deserialize, Serialize};

/// Result of registering an order with the payment provider
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Provider reference; confirmation signals are matched on it
    pub reference: String,
    /// Checkout url for the buyer, when the provider has one
    pub payment_url: Option<String>,
}

/// Outcome carried by a confirmation signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Approved,
    Rejected,
}

/// A confirmation/rejection signal from the payment provider
///
/// Providers may deliver the same signal multiple times; handlers must
/// treat duplicates as success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSignal {
    pub reference: String,
    pub outcome: PaymentOutcome,
}

/// External payment provider seam
pub trait PaymentChannel: Send + Sync {
    /// Register a payment and return the provider reference
    fn create_payment(&self, order_id: &str, amount: i64, buyer_phone: &str) -> PaymentIntent;
}

/// Offline provider used in SIMULATED mode and in tests
///
/// References are deterministic per order so repeated signals line up.
pub struct SimulatedPaymentChannel;

impl PaymentChannel for SimulatedPaymentChannel {
    fn create_payment(&self, order_id: &str, _amount: i64, _buyer_phone: &str) -> PaymentIntent {
        PaymentIntent {
            reference: format!("PAY-{}", order_id),
            payment_url: Some(format!("https://pay.invalid/checkout/{}", order_id)),
        }
    }
}
