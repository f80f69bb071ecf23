//! Order lifecycle
//!
//! Creation (buyer-facing and manual), payment confirmation, ticket
//! issuance hand-off, JIT expiry, and order queries.

pub mod expiry;
pub mod manager;
pub mod requests;

pub use manager::{
    ConfirmationOutcome, ManualOrderReceipt, OrderReceipt, OrderSearch, OrderSummary,
    OrderWithTickets, OrdersManager,
};
pub use requests::{CreateOrderRequest, ManualOrderRequest};
