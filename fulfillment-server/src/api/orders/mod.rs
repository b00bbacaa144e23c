//! Member Order API
//!
//! A member only ever sees their own orders and vouchers.
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /orders | GET | 我的订单 (分页) |
//! | /orders/vouchers | GET | 我的可用券 |
//! | /orders/{id} | GET | 订单详情 |
//! | /orders/{id}/receipt | GET | 小票视图 |
//! | /orders/{id}/vouchers | GET | 订单内的券 |
//! | /orders/{id}/cancel | POST | 取消订单 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_my_orders))
        .route("/vouchers", get(handler::list_my_vouchers))
        .route("/{id}", get(handler::get_my_order))
        .route("/{id}/receipt", get(handler::get_receipt))
        .route("/{id}/vouchers", get(handler::list_order_vouchers))
        .route("/{id}/cancel", post(handler::cancel_my_order))
}
