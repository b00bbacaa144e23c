//! 订单状态机
//!
//! ```text
//! PENDING ──► CONFIRMED ──► READY ──► COMPLETED
//!    │            │
//!    └────────────┴──► CANCELLED
//! ```
//!
//! 每次流转都是一次条件写入 (状态 + 时间线)。写入成功后再通知订单所有者，
//! 通知失败只记日志，不会把已提交的流转变成错误。
//!
//! 流转到 CANCELLED 一律经过 [`OrderStatusMachine::cancel_order`]，保证退款被计算。

use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Actor, CancellationResult, Order, OrderStatus, RefundOptions, TimelineEntry,
};

use super::refund;
use crate::db::repository::OrderStore;
use crate::notification::{NotificationDispatcher, messages, notify_best_effort};
use crate::security_log;

/// 状态更新未附带备注时的取消原因
pub const DEFAULT_CANCEL_REASON: &str = "Pedido cancelado pela loja";

#[derive(Clone)]
pub struct OrderStatusMachine {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl OrderStatusMachine {
    pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    pub async fn get_order(&self, order_id: i64) -> AppResult<Order> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::order_not_found(order_id))
    }

    /// 沿状态图前进一步
    ///
    /// 目标为 CANCELLED 时转交 [`cancel_order`](Self::cancel_order)：
    /// `notes` 作为取消原因，退款使用默认选项。
    pub async fn update_status(
        &self,
        order_id: i64,
        target: OrderStatus,
        actor: Actor,
        notes: Option<String>,
    ) -> AppResult<Order> {
        let order = self.get_order(order_id).await?;
        ensure_transition(&order, target)?;

        if target == OrderStatus::Cancelled {
            let reason = notes
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_CANCEL_REASON)
                .to_string();
            let result = self
                .cancel_order(order_id, &reason, actor, RefundOptions::default())
                .await?;
            return Ok(result.order);
        }

        let order = self.apply(order, target, actor, notes).await?;
        notify_best_effort(self.notifier.as_ref(), messages::order_status_changed(&order)).await;
        Ok(order)
    }

    /// 从 PENDING 或 CONFIRMED 取消，并计算退款
    ///
    /// 会员只能取消自己的订单，管理员可取消任意订单。
    pub async fn cancel_order(
        &self,
        order_id: i64,
        reason: &str,
        actor: Actor,
        options: RefundOptions,
    ) -> AppResult<CancellationResult> {
        let order = self.get_order(order_id).await?;

        if !actor.is_admin() && !order.is_owned_by(actor.id) {
            security_log!(
                "WARN",
                "order_cancel_denied",
                order_id = order_id,
                actor_id = actor.id
            );
            return Err(AppError::with_message(
                ErrorCode::NotOrderOwner,
                "Only the order owner can cancel this order",
            ));
        }

        if !order.status.is_cancellable() {
            return Err(AppError::invalid_state(
                ErrorCode::OrderNotCancellable,
                format!("Order in status {} cannot be cancelled", order.status),
            )
            .with_detail("orderId", order_id)
            .with_detail("status", order.status.as_str()));
        }

        let refunds = refund::calculate(&order, options, reason)?;
        let order = self
            .apply(order, OrderStatus::Cancelled, actor, Some(reason.to_string()))
            .await?;

        tracing::info!(
            order_id,
            points_to_refund = refunds.points_to_refund,
            money_refund = %refunds.money_amount(),
            cashback_to_revoke = %refunds.cashback_to_revoke,
            "Order cancelled"
        );
        notify_best_effort(
            self.notifier.as_ref(),
            messages::order_cancelled(&order, reason, &refunds),
        )
        .await;

        Ok(CancellationResult { order, refunds })
    }

    /// READY → COMPLETED (取货码已核对)
    pub async fn complete_order(&self, order_id: i64, actor: Actor) -> AppResult<Order> {
        let order = self.get_order(order_id).await?;
        if order.status != OrderStatus::Ready {
            return Err(AppError::invalid_state(
                ErrorCode::OrderNotReady,
                format!("Order must be READY to complete (current: {})", order.status),
            )
            .with_detail("orderId", order_id)
            .with_detail("status", order.status.as_str()));
        }

        let order = self
            .apply(order, OrderStatus::Completed, actor, None)
            .await?;
        notify_best_effort(self.notifier.as_ref(), messages::order_status_changed(&order)).await;
        Ok(order)
    }

    /// 持久化流转，并同步到已加载的订单
    async fn apply(
        &self,
        mut order: Order,
        target: OrderStatus,
        actor: Actor,
        notes: Option<String>,
    ) -> AppResult<Order> {
        let from = order.status;
        let now = shared::util::now_millis();
        let entry = TimelineEntry::new(target, &actor, notes, now);

        let applied = self
            .store
            .transition_status(order.id, from, target, &entry)
            .await?;

        if !applied {
            // 读写之间订单已被他人修改
            let current = self.get_order(order.id).await?;
            tracing::warn!(
                order_id = order.id,
                expected = %from,
                actual = %current.status,
                "Order status changed concurrently"
            );
            return Err(invalid_transition(current.status, target).with_detail("orderId", order.id));
        }

        tracing::info!(
            order_id = order.id,
            from = %from,
            to = %target,
            actor_id = actor.id,
            actor_role = actor.role.as_str(),
            "Order status updated"
        );

        order.status = target;
        order.updated_at = now;
        order.timeline.push(entry);
        Ok(order)
    }
}

fn invalid_transition(from: OrderStatus, to: OrderStatus) -> AppError {
    AppError::invalid_state(
        ErrorCode::InvalidTransition,
        format!("Invalid status transition: {} -> {}", from, to),
    )
    .with_detail("from", from.as_str())
    .with_detail("to", to.as_str())
}

fn ensure_transition(order: &Order, target: OrderStatus) -> AppResult<()> {
    if order.status.can_transition_to(target) {
        Ok(())
    } else {
        Err(invalid_transition(order.status, target).with_detail("orderId", order.id))
    }
}
