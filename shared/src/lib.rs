//! Shared types for the fulfillment engine
//!
//! Common types used by the server and its clients: domain models,
//! error types, response envelope and small utilities.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use response::{ApiResponse, Pagination};
