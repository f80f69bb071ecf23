//! Unified error codes for the Tombola engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order lifecycle errors
//! - 5xxx: Ticket issuance errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Codes are represented as u16 values for efficient serialization and
/// cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed (malformed or missing request fields)
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has expired and can no longer be approved
    OrderExpired = 4002,

    // ==================== 5xxx: Issuance ====================
    /// Card generation hit the retry safety ceiling
    IssuanceExhausted = 5001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Persistent store read/write failure
    StoreError = 9401,
    /// Persistent store content was corrupt (self-healed with backup)
    StoreCorrupt = 9402,
}

impl ErrorCode {
    /// Numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderExpired => "Order has expired",
            ErrorCode::IssuanceExhausted => "Card generation exhausted the retry budget",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StoreError => "Store operation failed",
            ErrorCode::StoreCorrupt => "Store content was corrupt",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::OrderExpired,
            5001 => ErrorCode::IssuanceExhausted,
            9001 => ErrorCode::InternalError,
            9401 => ErrorCode::StoreError,
            9402 => ErrorCode::StoreCorrupt,
            other => return Err(format!("unknown error code: {}", other)),
        };
        Ok(code)
    }
}
