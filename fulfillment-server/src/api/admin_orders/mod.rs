//! Admin Order API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /admin/orders | GET | 订单列表 (过滤、分页) |
//! | /admin/orders/{id} | GET | 订单详情 |
//! | /admin/orders/{id}/status | PATCH | 状态流转 |
//! | /admin/orders/batch/status | POST | 批量状态流转 |
//! | /admin/orders/{id}/cancel | POST | 取消并计算退款 |
//! | /admin/orders/{id}/complete | POST | 取货完成 |
//! | /admin/orders/pickup/validate | POST | 取货码校验 |
//! | /admin/orders/vouchers/{code}/use | POST | 核销券 |
//! | /admin/orders/vouchers/{code}/validate | GET | 券校验 |
//!
//! 全部需要管理员角色。

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, patch, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/admin/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_orders))
        .route("/batch/status", post(handler::batch_update_status))
        .route("/pickup/validate", post(handler::validate_pickup))
        .route("/vouchers/{code}/use", post(handler::use_voucher))
        .route("/vouchers/{code}/validate", get(handler::validate_voucher))
        .route("/{id}", get(handler::get_order))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/cancel", post(handler::cancel_order))
        .route("/{id}/complete", post(handler::complete_order))
        .route_layer(middleware::from_fn(require_admin))
}
