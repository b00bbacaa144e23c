//! 兑换券生命周期：查询、校验、核销、列表、到期提醒
//!
//! 校验按固定顺序进行，先失败者为准：订单已取消 → 已使用 → 已过期。
//! 既已使用又已过期的券报告 "utilizado"。

use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{OrderStatus, UserVoucher, Voucher, VoucherListOptions, VoucherValidation};

use crate::db::repository::{VoucherQuery, VoucherStore};
use crate::notification::{NotificationDispatcher, messages, notify_best_effort};

/// 到期提醒覆盖的天数
pub const EXPIRATION_WARNING_DAYS: i64 = 7;

/// 券不可核销的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invalidity {
    OrderCancelled,
    AlreadyUsed { used_at: Option<i64> },
    Expired { expired_at: i64 },
}

impl Invalidity {
    fn reason(&self) -> &'static str {
        match self {
            Invalidity::OrderCancelled => "O pedido deste voucher foi cancelado",
            Invalidity::AlreadyUsed { .. } => "Este voucher já foi utilizado",
            Invalidity::Expired { .. } => "Este voucher está expirado",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Invalidity::OrderCancelled => ErrorCode::OrderCancelled,
            Invalidity::AlreadyUsed { .. } => ErrorCode::VoucherAlreadyUsed,
            Invalidity::Expired { .. } => ErrorCode::VoucherExpired,
        }
    }

    fn into_error(self, code: &str) -> AppError {
        let mut err =
            AppError::invalid_state(self.code(), self.reason()).with_detail("voucherCode", code);
        match self {
            Invalidity::AlreadyUsed { used_at: Some(at) } => err = err.with_detail("usedAt", at),
            Invalidity::Expired { expired_at } => err = err.with_detail("expiredAt", expired_at),
            _ => {}
        }
        err
    }
}

fn check(voucher: &Voucher, now: i64) -> Option<Invalidity> {
    if voucher.order.status == OrderStatus::Cancelled {
        return Some(Invalidity::OrderCancelled);
    }
    if voucher.item.voucher_used {
        return Some(Invalidity::AlreadyUsed {
            used_at: voucher.item.voucher_used_at,
        });
    }
    match voucher.item.voucher_expires_at {
        Some(expired_at) if expired_at < now => Some(Invalidity::Expired { expired_at }),
        _ => None,
    }
}

fn evaluate(voucher: Voucher, now: i64) -> VoucherValidation {
    let invalidity = check(&voucher, now);
    VoucherValidation {
        valid: invalidity.is_none(),
        reason: invalidity.map(|i| i.reason().to_string()),
        used_at: match invalidity {
            Some(Invalidity::AlreadyUsed { used_at }) => used_at,
            _ => None,
        },
        expired_at: match invalidity {
            Some(Invalidity::Expired { expired_at }) => Some(expired_at),
            _ => None,
        },
        voucher,
    }
}

fn with_expiry_flag(voucher: Voucher, now: i64) -> UserVoucher {
    UserVoucher {
        is_expired: voucher.item.is_expired_at(now),
        voucher,
    }
}

#[derive(Clone)]
pub struct VoucherLifecycleManager {
    store: Arc<dyn VoucherStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl VoucherLifecycleManager {
    pub fn new(store: Arc<dyn VoucherStore>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    pub async fn get_voucher_by_code(&self, code: &str) -> AppResult<Voucher> {
        let code = shared::util::normalize_code(code);
        if code.is_empty() {
            return Err(AppError::validation("Voucher code is required"));
        }
        self.store
            .find_voucher_by_code(&code)
            .await?
            .ok_or_else(|| AppError::voucher_not_found(&code))
    }

    /// 未知券码返回 NotFound，已知券码总是给出校验结果
    pub async fn validate_voucher(&self, code: &str) -> AppResult<VoucherValidation> {
        let voucher = self.get_voucher_by_code(code).await?;
        Ok(evaluate(voucher, shared::util::now_millis()))
    }

    /// 核销兑换券，只能成功一次
    ///
    /// 存储层是一次条件更新。竞争失败时重新读取，并报告不可核销的原因。
    pub async fn mark_voucher_as_used(
        &self,
        code: &str,
        actor_id: Option<i64>,
    ) -> AppResult<Voucher> {
        let mut voucher = self.get_voucher_by_code(code).await?;
        let now = shared::util::now_millis();
        if let Some(invalidity) = check(&voucher, now) {
            return Err(invalidity.into_error(voucher.code()));
        }

        let canonical = voucher.code().to_string();
        let redeemed = self
            .store
            .mark_voucher_used(&canonical, now, actor_id)
            .await?;

        if !redeemed {
            let current = self.get_voucher_by_code(&canonical).await?;
            let invalidity = check(&current, shared::util::now_millis())
                .unwrap_or(Invalidity::AlreadyUsed {
                    used_at: current.item.voucher_used_at,
                });
            tracing::warn!(voucher_code = %canonical, "Voucher redemption lost a race");
            return Err(invalidity.into_error(&canonical));
        }

        voucher.item.voucher_used = true;
        voucher.item.voucher_used_at = Some(now);
        voucher.item.voucher_used_by = actor_id;
        tracing::info!(
            voucher_code = %canonical,
            order_id = voucher.order.id,
            actor_id = ?actor_id,
            "Voucher redeemed"
        );

        notify_best_effort(self.notifier.as_ref(), messages::voucher_used(&voucher)).await;
        Ok(voucher)
    }

    /// 会员的兑换券，最新的在前。已取消订单的券不会列出。
    pub async fn get_user_vouchers(
        &self,
        user_id: i64,
        options: VoucherListOptions,
    ) -> AppResult<Vec<UserVoucher>> {
        let now = shared::util::now_millis();
        let query = VoucherQuery::for_owner(user_id, options, now);
        let vouchers = self.store.list_vouchers(&query).await?;
        Ok(vouchers
            .into_iter()
            .map(|v| with_expiry_flag(v, now))
            .collect())
    }

    pub async fn list_order_vouchers(&self, order_id: i64) -> AppResult<Vec<UserVoucher>> {
        let now = shared::util::now_millis();
        let vouchers = self.store.list_order_vouchers(order_id).await?;
        Ok(vouchers
            .into_iter()
            .map(|v| with_expiry_flag(v, now))
            .collect())
    }

    /// 未取消订单中未使用且在 `(now, now + days]` 内到期的券
    pub async fn get_vouchers_expiring_soon(&self, days: i64) -> AppResult<Vec<Voucher>> {
        let query = VoucherQuery::expiring_soon(shared::util::now_millis(), days);
        Ok(self.store.list_vouchers(&query).await?)
    }

    /// 为未来一周内到期的每张券发送一次提醒
    ///
    /// 返回处理的券数量 (即尝试投递的次数)。
    pub async fn send_expiration_warnings(&self) -> AppResult<usize> {
        let vouchers = self
            .get_vouchers_expiring_soon(EXPIRATION_WARNING_DAYS)
            .await?;
        let now = shared::util::now_millis();

        for voucher in &vouchers {
            let Some(expires_at) = voucher.item.voucher_expires_at else {
                continue;
            };
            let days_remaining = shared::util::ceil_days_until(expires_at, now);
            notify_best_effort(
                self.notifier.as_ref(),
                messages::voucher_expiring(voucher, days_remaining),
            )
            .await;
        }

        Ok(vouchers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{ItemType, OrderItem, VoucherOrderRef};

    const NOW: i64 = 1_700_000_000_000;

    fn voucher(status: OrderStatus, used_at: Option<i64>, expires_at: Option<i64>) -> Voucher {
        Voucher {
            item: OrderItem {
                id: 1,
                order_id: 2,
                product_name: "Café".into(),
                product_image: None,
                item_type: ItemType::Voucher,
                quantity: 1,
                unit_price: Decimal::ZERO,
                unit_points: 0,
                voucher_code: Some("VCH-1".into()),
                voucher_used: used_at.is_some(),
                voucher_used_at: used_at,
                voucher_used_by: None,
                voucher_expires_at: expires_at,
                created_at: 0,
            },
            order: VoucherOrderRef {
                id: 2,
                code: "PED-2".into(),
                user_id: 3,
                status,
            },
        }
    }

    #[test]
    fn test_valid_voucher() {
        let v = evaluate(voucher(OrderStatus::Confirmed, None, None), NOW);
        assert!(v.valid);
        assert!(v.reason.is_none());
    }

    #[test]
    fn test_cancelled_order_wins_over_everything() {
        let v = evaluate(
            voucher(OrderStatus::Cancelled, Some(NOW - 10), Some(NOW - 1_000)),
            NOW,
        );
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("cancelado"));
    }

    #[test]
    fn test_used_wins_over_expired() {
        let v = evaluate(
            voucher(OrderStatus::Completed, Some(NOW - 10), Some(NOW - 1_000)),
            NOW,
        );
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("utilizado"));
        assert_eq!(v.used_at, Some(NOW - 10));
        assert_eq!(v.expired_at, None);
    }

    #[test]
    fn test_expired() {
        let v = evaluate(voucher(OrderStatus::Confirmed, None, Some(NOW - 1_000)), NOW);
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("expirado"));
        assert_eq!(v.expired_at, Some(NOW - 1_000));
    }

    #[test]
    fn test_invalidity_error_carries_reason() {
        let err = Invalidity::Expired { expired_at: 5 }.into_error("VCH-1");
        assert_eq!(err.code, ErrorCode::VoucherExpired);
        assert!(err.is_invalid_state());
        assert!(err.message.contains("expirado"));
    }

    #[test]
    fn test_expiry_flag() {
        let listed = with_expiry_flag(voucher(OrderStatus::Ready, None, Some(NOW - 1)), NOW);
        assert!(listed.is_expired);
        let listed = with_expiry_flag(voucher(OrderStatus::Ready, None, None), NOW);
        assert!(!listed.is_expired);
    }
}
