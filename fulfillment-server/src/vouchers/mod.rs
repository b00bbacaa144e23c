//! 兑换券
//!
//! - [`VoucherLifecycleManager`] - 校验、核销、列表、到期提醒
//! - [`ExpirationSweepScheduler`] - 每日触发到期提醒

pub mod expiration_scheduler;
pub mod lifecycle;

pub use expiration_scheduler::ExpirationSweepScheduler;
pub use lifecycle::{EXPIRATION_WARNING_DAYS, VoucherLifecycleManager};
