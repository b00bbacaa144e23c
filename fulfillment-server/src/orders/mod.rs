//! 订单履约
//!
//! - [`OrderStatusMachine`] - 受控流转、取消、完成
//! - [`refund`] - 取消时的退款指令
//! - [`PickupValidator`] - 扫码/输入码 → 订单
//! - [`BatchOperationCoordinator`] - 对多个订单执行同一状态变更

pub mod batch;
pub mod pickup;
pub mod refund;
pub mod status_machine;

pub use batch::BatchOperationCoordinator;
pub use pickup::PickupValidator;
pub use status_machine::{DEFAULT_CANCEL_REASON, OrderStatusMachine};
