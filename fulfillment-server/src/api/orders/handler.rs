//! Member Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    CancellationResult, Order, OrderReceipt, OrderSummary, RefundOptions, UserVoucher,
    VoucherListOptions,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::OrderFilter;
use crate::security_log;
use crate::utils::validation::MAX_NOTE_LEN;
use crate::utils::{
    ApiResponse, AppError, AppResult, ErrorCode, Pagination, PaginationParams, validate_request,
};

#[derive(Debug, Deserialize, Validate)]
pub struct MemberCancelRequest {
    #[validate(length(min = 1, max = MAX_NOTE_LEN, message = "a cancellation reason is required"))]
    pub reason: String,
}

/// Load an order the caller may see
async fn load_owned(state: &ServerState, user: &CurrentUser, id: i64) -> AppResult<Order> {
    let order = state.status_machine.get_order(id).await?;
    if !user.is_admin() && !order.is_owned_by(user.id) {
        security_log!(
            "WARN",
            "order_access_denied",
            order_id = id,
            user_id = user.id
        );
        return Err(AppError::with_message(
            ErrorCode::NotOrderOwner,
            "This order belongs to another user",
        ));
    }
    Ok(order)
}

pub async fn list_my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<OrderSummary>>>> {
    let (page, limit) = params.checked()?;
    let filter = OrderFilter::for_user(user.id, page, limit);
    let (orders, total) = state.orders.list_orders(&filter).await?;
    Ok(Json(ApiResponse::paginated(
        orders,
        Pagination::new(page, limit, total),
    )))
}

/// Active vouchers only: unused and not expired
pub async fn list_my_vouchers(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<UserVoucher>>>> {
    let vouchers = state
        .vouchers
        .get_user_vouchers(user.id, VoucherListOptions::default())
        .await?;
    Ok(Json(ApiResponse::ok(vouchers)))
}

pub async fn get_my_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = load_owned(&state, &user, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn get_receipt(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderReceipt>>> {
    let order = load_owned(&state, &user, id).await?;
    Ok(Json(ApiResponse::ok(OrderReceipt::from(&order))))
}

pub async fn list_order_vouchers(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<UserVoucher>>>> {
    let order = load_owned(&state, &user, id).await?;
    let vouchers = state.vouchers.list_order_vouchers(order.id).await?;
    Ok(Json(ApiResponse::ok(vouchers)))
}

/// Member cancellation with the default refund flags
pub async fn cancel_my_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<MemberCancelRequest>,
) -> AppResult<Json<ApiResponse<CancellationResult>>> {
    validate_request(&payload)?;
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("a cancellation reason is required"));
    }
    // Ownership is enforced by the status machine
    let result = state
        .status_machine
        .cancel_order(id, reason, user.actor(), RefundOptions::default())
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}
