//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::OrderItem;

// ============================================================================
// Status
// ============================================================================

/// 订单状态
///
/// ```text
/// PENDING ──► CONFIRMED ──► READY ──► COMPLETED
///    │            │
///    └────────────┴──► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses reachable in one step from `self`
    pub const fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// COMPLETED and CANCELLED never move again
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub const fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown order status: {}", s))
    }
}

/// 下单渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSource {
    /// 会员 App
    App,
    /// 网页商城
    Web,
    /// 门店柜台
    Store,
}

impl OrderSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderSource::App => "APP",
            OrderSource::Web => "WEB",
            OrderSource::Store => "STORE",
        }
    }
}

impl FromStr for OrderSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [OrderSource::App, OrderSource::Web, OrderSource::Store]
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown order source: {}", s))
    }
}

// ============================================================================
// Actor
// ============================================================================

/// Role of whoever drives a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Admin,
    Member,
    /// Background jobs and the placement flow
    System,
}

impl ActorRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Admin => "ADMIN",
            ActorRole::Member => "MEMBER",
            ActorRole::System => "SYSTEM",
        }
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ActorRole::Admin, ActorRole::Member, ActorRole::System]
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown actor role: {}", s))
    }
}

/// Who is performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub role: ActorRole,
}

impl Actor {
    pub fn admin(id: i64) -> Self {
        Self {
            id,
            role: ActorRole::Admin,
        }
    }

    pub fn member(id: i64) -> Self {
        Self {
            id,
            role: ActorRole::Member,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

// ============================================================================
// Order
// ============================================================================

/// 支付明细
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub points_used: i64,
    pub money_paid: Decimal,
    pub cashback_earned: Decimal,
}

/// 取货信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupInfo {
    /// Dedicated code printed as QR, distinct from the order code
    pub pickup_code: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: Option<i64>,
}

/// One entry of the append-only status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub actor_id: Option<i64>,
    pub actor_role: ActorRole,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl TimelineEntry {
    pub fn new(status: OrderStatus, actor: &Actor, notes: Option<String>, created_at: i64) -> Self {
        Self {
            status,
            actor_id: Some(actor.id),
            actor_role: actor.role,
            notes,
            created_at,
        }
    }
}

/// Order aggregate with items and timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// Human-facing code (e.g. "PED-7F3K2Q")
    pub code: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub source: OrderSource,
    pub payment: PaymentBreakdown,
    pub pickup: PickupInfo,
    pub items: Vec<OrderItem>,
    pub timeline: Vec<TimelineEntry>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    pub fn items_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

/// List row (no items or timeline)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: i64,
    pub code: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub source: OrderSource,
    pub payment: PaymentBreakdown,
    pub items_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of resolving a scan/entry code at the pickup counter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupValidation {
    pub order_id: i64,
    pub order_code: String,
    pub owner_id: i64,
    pub status: OrderStatus,
    pub items_count: i64,
    pub can_complete: bool,
    pub pickup: PickupInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_cancel_edges() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_no_skips_backwards_or_self_loops() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Ready));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Confirmed));
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_terminal(), status.allowed_transitions().is_empty());
        }
    }

    #[test]
    fn test_status_parse_and_serde() {
        assert_eq!("ready".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }
}
