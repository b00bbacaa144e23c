//! HTTP API
//!
//! - [`health`] - 公共健康检查
//! - [`orders`] - 会员订单与券 (本人)
//! - [`admin_orders`] - 后台订单履约与核销 (管理员)
//!
//! 除 `/health` 外全部路由要求 Bearer JWT。

pub mod admin_orders;
pub mod health;
pub mod orders;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// Routes that require a signed-in user
fn protected_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(orders::router())
        .merge(admin_orders::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Build a fully configured application with all middleware and state
///
/// Used by the HTTP server and by tests driving the router with `oneshot`.
pub fn build_app(state: &ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(protected_routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
