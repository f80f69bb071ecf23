//! Whole-document persistent store
//!
//! One JSON file holds the entire database. Every operation loads the
//! full document, mutates an in-memory copy, and writes the whole thing
//! back via tmp-file-then-rename. A single async mutex makes the
//! "single writer at a time" assumption explicit: all mutations flow
//! through [`Store::begin`] → [`StoreTxn::commit`].

pub mod document;
pub mod file;
pub mod handle;

pub use document::{Document, IdempotencyClaim};
pub use file::{DocumentFile, StoreError, StoreResult};
pub use handle::{Store, StoreTxn};
