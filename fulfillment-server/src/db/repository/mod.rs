//! Repository Module
//!
//! The persistence accessor seen by the fulfillment core. Components only
//! talk to [`OrderStore`] and [`VoucherStore`]; the SQLite repositories are
//! the production implementations.

pub mod order;
pub mod voucher;

pub use order::{NewOrder, NewOrderItem, OrderRepository};
pub use voucher::VoucherRepository;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Order, OrderSource, OrderStatus, OrderSummary, TimelineEntry, Voucher, VoucherListOptions,
};
use shared::util::DAY_MILLIS;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::InvalidRequest, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// Order access
// =============================================================================

/// Filters of the admin order list. Dates are already resolved to millis,
/// `created_to` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub source: Option<OrderSource>,
    pub user_id: Option<i64>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub page: u32,
    pub limit: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            source: None,
            user_id: None,
            created_from: None,
            created_to: None,
            page: 1,
            limit: 20,
        }
    }
}

impl OrderFilter {
    pub fn for_user(user_id: i64, page: u32, limit: u32) -> Self {
        Self {
            user_id: Some(user_id),
            page,
            limit,
            ..Default::default()
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_order(&self, id: i64) -> RepoResult<Option<Order>>;

    /// Match on the order code or the pickup code (already normalized)
    async fn find_order_by_code(&self, code: &str) -> RepoResult<Option<Order>>;

    /// Newest first, with the total count before paging
    async fn list_orders(&self, filter: &OrderFilter) -> RepoResult<(Vec<OrderSummary>, u64)>;

    /// Move `id` from `from` to `to` and append `entry`, atomically.
    ///
    /// Returns `false` without writing anything when the stored status is no
    /// longer `from`.
    async fn transition_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        entry: &TimelineEntry,
    ) -> RepoResult<bool>;
}

// =============================================================================
// Voucher access
// =============================================================================

/// Voucher selection. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherQuery {
    pub owner_id: Option<i64>,
    /// `Some(false)` restricts to unused vouchers
    pub used: Option<bool>,
    /// Drop vouchers whose expiry is before this instant (null expiry passes)
    pub not_expired_at: Option<i64>,
    /// Expiry non-null and within `(after, until]`
    pub expiring_within: Option<(i64, i64)>,
    pub exclude_cancelled: bool,
}

impl VoucherQuery {
    /// A member's own vouchers, as listed to them
    pub fn for_owner(owner_id: i64, options: VoucherListOptions, now: i64) -> Self {
        Self {
            owner_id: Some(owner_id),
            used: (!options.include_used).then_some(false),
            not_expired_at: (!options.include_expired).then_some(now),
            expiring_within: None,
            exclude_cancelled: true,
        }
    }

    /// Unused vouchers expiring in the next `days` days
    pub fn expiring_soon(now: i64, days: i64) -> Self {
        Self {
            owner_id: None,
            used: Some(false),
            not_expired_at: None,
            expiring_within: Some((now, now + days * DAY_MILLIS)),
            exclude_cancelled: true,
        }
    }
}

#[async_trait]
pub trait VoucherStore: Send + Sync {
    /// VOUCHER-typed item by code (already normalized), with its parent order
    async fn find_voucher_by_code(&self, code: &str) -> RepoResult<Option<Voucher>>;

    /// Newest first
    async fn list_vouchers(&self, query: &VoucherQuery) -> RepoResult<Vec<Voucher>>;

    async fn list_order_vouchers(&self, order_id: i64) -> RepoResult<Vec<Voucher>>;

    /// Single conditional write: succeeds only while the voucher is unused,
    /// not expired at `used_at` and its order is not cancelled. At most one
    /// caller ever gets `true` for a given code.
    async fn mark_voucher_used(
        &self,
        code: &str,
        used_at: i64,
        used_by: Option<i64>,
    ) -> RepoResult<bool>;
}

// =============================================================================
// Money helpers (amounts are stored as integer cents)
// =============================================================================

pub(crate) fn to_cents(amount: Decimal) -> RepoResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| RepoError::Validation(format!("Amount out of range: {amount}")))
}

pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
