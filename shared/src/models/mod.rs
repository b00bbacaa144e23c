//! Data models
//!
//! Shared between the fulfillment server and its clients (via API).
//! All IDs are `i64`, all timestamps Unix millis.

pub mod batch;
pub mod notification;
pub mod order;
pub mod receipt;
pub mod refund;
pub mod voucher;

// Re-exports
pub use batch::*;
pub use notification::*;
pub use order::*;
pub use receipt::*;
pub use refund::*;
pub use voucher::*;
