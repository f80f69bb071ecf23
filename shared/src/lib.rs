//! Shared types for the Tombola card-sales engine
//!
//! Common types used across crates: domain models (events, offers,
//! orders, tickets, vendor ledger) and the unified error system.

pub mod error;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use models::{
    CardGrid, Event, EventState, EventStateEntry, IdempotencyRecord, Offer, Order, OrderStatus,
    Ticket, Vendor, VendorStats,
};
