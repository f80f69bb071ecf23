//! Ticket issuance
//!
//! Everything between "order is PAID" and "cards exist": grid generation,
//! serial assignment, the at-most-once issuance coordinator, the vendor
//! ledger, and the artifact-renderer collaborator seam.

pub mod files;
pub mod grid;
pub mod issuance;
pub mod ledger;
pub mod serial;

pub use files::{DirectoryTicketRenderer, NoopRenderer, TicketArtifacts, TicketRenderer};
pub use issuance::{IssuanceError, IssuanceReport, TicketIssuer};
pub use ledger::{apply_vendor_stats_once, resolve_vendor, ResolvedVendor};
