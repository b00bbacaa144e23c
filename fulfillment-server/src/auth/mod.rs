//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文 (同时是 axum extractor)
//! - [`require_auth`] / [`require_admin`] - 中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, UserRole};
pub use middleware::{require_admin, require_auth};
