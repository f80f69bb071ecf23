//! Tombola Server - order lifecycle and card issuance engine
//!
//! # Architecture
//!
//! The engine turns paid orders into unique bingo-style cards, on top of
//! a single-file JSON document store:
//!
//! - **Store** (`store`): whole-document persistence with atomic saves
//!   and self-healing loads
//! - **Orders** (`orders`): creation, payment confirmation, JIT expiry
//! - **Tickets** (`tickets`): grid generation, serials, issuance, vendor
//!   ledger
//! - **Events** (`events`): admin upserts, offer catalogs, reporting
//! - **Payments** (`payments`): external provider seam
//!
//! # Module structure
//!
//! ```text
//! tombola-server/src/
//! ├── core/          # configuration
//! ├── store/         # document store
//! ├── orders/        # order lifecycle manager
//! ├── tickets/       # card generation and issuance
//! ├── events/        # event administration and reporting
//! └── payments/      # payment channel seam
//! ```

pub mod core;
pub mod events;
pub mod orders;
pub mod payments;
pub mod store;
pub mod tickets;

// Re-export the operation surface
pub use crate::core::{Config, PaymentMode};
pub use events::{EventOverview, EventPatch, EventsAdmin, OfferInput};
pub use orders::{
    ConfirmationOutcome, CreateOrderRequest, ManualOrderRequest, OrderReceipt, OrderSearch,
    OrdersManager,
};
pub use payments::{PaymentChannel, PaymentOutcome, PaymentSignal, SimulatedPaymentChannel};
pub use store::{Store, StoreError};
pub use tickets::{DirectoryTicketRenderer, IssuanceError, TicketIssuer, TicketRenderer};

// Re-export unified error types from shared
pub use shared::{AppError, AppResult, ErrorCode};
