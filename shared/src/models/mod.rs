//! Domain models
//!
//! All persisted entities of the card-sales engine. Everything here is
//! plain serde data; behavior lives in the server crate.

pub mod event;
pub mod offer;
pub mod order;
pub mod ticket;
pub mod vendor;

pub use event::Event;
pub use offer::Offer;
pub use order::{IdempotencyRecord, Order, OrderStatus, MAX_COMBOS_COUNT, MAX_COMBO_SIZE};
pub use ticket::{CardGrid, Ticket, FREE_CELL};
pub use vendor::{EventState, EventStateEntry, GeneratedCard, GeneratedCardMeta, Vendor, VendorStats};
