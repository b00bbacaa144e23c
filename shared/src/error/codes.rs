//! Unified error codes for the fulfillment engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Refund errors
//! - 6xxx: Voucher errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Actor does not own the order
    NotOrderOwner = 2006,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status transition is not on the transition graph
    InvalidTransition = 4010,
    /// Order can only be cancelled while PENDING or CONFIRMED
    OrderNotCancellable = 4011,
    /// Order must be READY to be completed
    OrderNotReady = 4012,
    /// Order has been cancelled
    OrderCancelled = 4013,

    // ==================== 5xxx: Refund ====================
    /// Refund computation refused for the order state
    RefundNotAllowed = 5006,

    // ==================== 6xxx: Voucher ====================
    /// Voucher code does not resolve to a voucher item
    VoucherNotFound = 6901,
    /// Voucher was already redeemed
    VoucherAlreadyUsed = 6902,
    /// Voucher is past its expiration
    VoucherExpired = 6903,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Codes that mean "the target does not exist"
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::NotFound | ErrorCode::OrderNotFound | ErrorCode::VoucherNotFound
        )
    }

    /// Codes that mean "the target exists but its state forbids the action"
    pub const fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidTransition
                | ErrorCode::OrderNotCancellable
                | ErrorCode::OrderNotReady
                | ErrorCode::OrderCancelled
                | ErrorCode::RefundNotAllowed
                | ErrorCode::VoucherAlreadyUsed
                | ErrorCode::VoucherExpired
        )
    }

    /// Codes that mean "the actor may not do this"
    pub const fn is_forbidden(&self) -> bool {
        matches!(
            self,
            ErrorCode::PermissionDenied | ErrorCode::AdminRequired | ErrorCode::NotOrderOwner
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::NotOrderOwner => "Order belongs to another user",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid order status transition",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",
            ErrorCode::OrderNotReady => "Order is not ready for pickup",
            ErrorCode::OrderCancelled => "Order has been cancelled",

            // Refund
            ErrorCode::RefundNotAllowed => "Refund is not allowed for this order",

            // Voucher
            ErrorCode::VoucherNotFound => "Voucher not found",
            ErrorCode::VoucherAlreadyUsed => "Voucher has already been used",
            ErrorCode::VoucherExpired => "Voucher has expired",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::NotOrderOwner),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4010 => Ok(ErrorCode::InvalidTransition),
            4011 => Ok(ErrorCode::OrderNotCancellable),
            4012 => Ok(ErrorCode::OrderNotReady),
            4013 => Ok(ErrorCode::OrderCancelled),

            // Refund
            5006 => Ok(ErrorCode::RefundNotAllowed),

            // Voucher
            6901 => Ok(ErrorCode::VoucherNotFound),
            6902 => Ok(ErrorCode::VoucherAlreadyUsed),
            6903 => Ok(ErrorCode::VoucherExpired),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InvalidTransition.code(), 4010);
        assert_eq!(ErrorCode::VoucherAlreadyUsed.code(), 6902);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_roundtrip() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::NotOrderOwner,
            ErrorCode::OrderNotCancellable,
            ErrorCode::RefundNotAllowed,
            ErrorCode::VoucherExpired,
            ErrorCode::ConfigError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::VoucherNotFound).unwrap();
        assert_eq!(json, "6901");
        let code: ErrorCode = serde_json::from_str("4011").unwrap();
        assert_eq!(code, ErrorCode::OrderNotCancellable);
        assert!(serde_json::from_str::<ErrorCode>("77").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::Success.to_string(), "E0000");
        assert_eq!(ErrorCode::VoucherExpired.to_string(), "E6903");
    }

    #[test]
    fn test_taxonomy_groups_are_disjoint() {
        let all = [
            ErrorCode::NotFound,
            ErrorCode::OrderNotFound,
            ErrorCode::VoucherNotFound,
            ErrorCode::InvalidTransition,
            ErrorCode::OrderNotCancellable,
            ErrorCode::OrderNotReady,
            ErrorCode::OrderCancelled,
            ErrorCode::VoucherAlreadyUsed,
            ErrorCode::VoucherExpired,
            ErrorCode::PermissionDenied,
            ErrorCode::NotOrderOwner,
        ];
        for code in all {
            let hits = [code.is_not_found(), code.is_invalid_state(), code.is_forbidden()]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(hits, 1, "{code:?} must belong to exactly one group");
        }
    }
}
