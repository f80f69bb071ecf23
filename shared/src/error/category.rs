//! Error categories derived from code ranges

use super::codes::ErrorCode;

/// High-level category of an error code
///
/// Categories follow the numeric ranges of [`ErrorCode`]:
/// - 0xxx: General
/// - 4xxx: Order lifecycle
/// - 5xxx: Ticket issuance
/// - 9xxx: System
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    Order,
    Issuance,
    System,
}

impl ErrorCode {
    /// Category of this error code
    pub fn category(&self) -> ErrorCategory {
        match u16::from(*self) {
            0..=999 => ErrorCategory::General,
            4000..=4999 => ErrorCategory::Order,
            5000..=5999 => ErrorCategory::Issuance,
            _ => ErrorCategory::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ranges() {
        assert_eq!(ErrorCode::ValidationFailed.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::OrderExpired.category(), ErrorCategory::Order);
        assert_eq!(
            ErrorCode::IssuanceExhausted.category(),
            ErrorCategory::Issuance
        );
        assert_eq!(ErrorCode::StoreCorrupt.category(), ErrorCategory::System);
    }
}
