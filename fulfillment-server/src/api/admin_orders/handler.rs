//! Admin Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    BatchOutcome, CancellationResult, Order, OrderSource, OrderStatus, OrderSummary,
    PickupValidation, RefundOptions, Voucher, VoucherValidation,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::OrderFilter;
use crate::utils::validation::{MAX_CODE_LEN, MAX_NOTE_LEN};
use crate::utils::{
    ApiResponse, AppError, AppResult, Pagination, PaginationParams, time, validate_request,
};

/// `GET /admin/orders` query string
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub source: Option<String>,
    /// YYYY-MM-DD, business timezone
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end_date: Option<String>,
    pub user_id: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AdminOrderQuery {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(length(max = MAX_NOTE_LEN))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    #[validate(length(min = 1, message = "at least one order id is required"))]
    pub order_ids: Vec<i64>,
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(length(max = MAX_NOTE_LEN))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    #[validate(length(min = 1, max = MAX_NOTE_LEN, message = "a cancellation reason is required"))]
    pub reason: String,
    #[serde(default = "default_true")]
    pub refund_points: bool,
    #[serde(default = "default_true")]
    pub refund_money: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct PickupRequest {
    #[validate(length(min = 1, max = MAX_CODE_LEN))]
    pub code: String,
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(AppError::validation)
}

/// Paginated, filtered order list
pub async fn list_orders(
    State(state): State<ServerState>,
    Query(query): Query<AdminOrderQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderSummary>>>> {
    let (page, limit) = query.pagination().checked()?;
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let source = query
        .source
        .as_deref()
        .map(|s| s.parse::<OrderSource>().map_err(AppError::validation))
        .transpose()?;
    let (created_from, created_to) = time::date_range_millis(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        state.config.tz(),
    )?;

    let filter = OrderFilter {
        status,
        source,
        user_id: query.user_id,
        created_from,
        created_to,
        page,
        limit,
    };
    let (orders, total) = state.orders.list_orders(&filter).await?;
    Ok(Json(ApiResponse::paginated(
        orders,
        Pagination::new(page, limit, total),
    )))
}

pub async fn get_order(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.status_machine.get_order(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    validate_request(&payload)?;
    let target = parse_status(&payload.status)?;
    let order = state
        .status_machine
        .update_status(id, target, user.actor(), payload.notes)
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Per-order failures are part of the outcome, never a request error
pub async fn batch_update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BatchStatusRequest>,
) -> AppResult<Json<ApiResponse<BatchOutcome>>> {
    validate_request(&payload)?;
    let max = state.config.max_batch_size;
    if payload.order_ids.len() > max {
        return Err(AppError::validation(format!(
            "A batch accepts at most {} orders ({} given)",
            max,
            payload.order_ids.len()
        )));
    }
    let target = parse_status(&payload.status)?;

    let outcome = state
        .batch
        .batch_update_status(&payload.order_ids, target, user.actor(), payload.notes)
        .await;
    Ok(Json(ApiResponse::ok(outcome)))
}

pub async fn cancel_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<CancellationResult>>> {
    validate_request(&payload)?;
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("a cancellation reason is required"));
    }
    let options = RefundOptions {
        refund_points: payload.refund_points,
        refund_money: payload.refund_money,
    };
    let result = state
        .status_machine
        .cancel_order(id, reason, user.actor(), options)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn complete_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.status_machine.complete_order(id, user.actor()).await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn validate_pickup(
    State(state): State<ServerState>,
    Json(payload): Json<PickupRequest>,
) -> AppResult<Json<ApiResponse<PickupValidation>>> {
    validate_request(&payload)?;
    let validation = state.pickup.validate_pickup(&payload.code).await?;
    Ok(Json(ApiResponse::ok(validation)))
}

pub async fn use_voucher(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<Voucher>>> {
    let voucher = state
        .vouchers
        .mark_voucher_as_used(&code, Some(user.id))
        .await?;
    Ok(Json(ApiResponse::ok(voucher)))
}

pub async fn validate_voucher(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<VoucherValidation>>> {
    let validation = state.vouchers.validate_voucher(&code).await?;
    Ok(Json(ApiResponse::ok(validation)))
}
