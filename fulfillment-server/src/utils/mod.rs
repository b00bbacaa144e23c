//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] / [`ApiResponse`] - 统一错误与响应 (from shared)
//! - [`logger`] - 日志初始化
//! - [`time`] - 业务时区日期转换
//! - [`types`] - 查询参数
//! - [`validation`] - 请求体校验

pub mod logger;
pub mod time;
pub mod types;
pub mod validation;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use shared::response::{ApiResponse, Pagination};
pub use types::PaginationParams;
pub use validation::validate_request;
