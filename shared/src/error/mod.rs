//! Unified error system
//!
//! Structured error codes plus the [`AppError`] type returned by every
//! operation surface in the engine. Module-level `thiserror` enums in the
//! server crate convert into [`AppError`] at the boundary.

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{AppError, AppResult};
