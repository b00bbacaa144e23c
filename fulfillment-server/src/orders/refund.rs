//! 取消退款计算
//!
//! 纯计算：根据待取消订单和调用方的退款选项，得出应退还会员的积分与金额。
//! 积分入账和支付冲正不在这里执行。
//!
//! 按行金额比例分摊到各商品，舍入余数计入最后一行，明细之和始终等于总额。

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ItemRefund, MoneyRefundRequest, Order, RefundOptions, RefundResult};

/// 金额精度 (分)
const DECIMAL_PLACES: u32 = 2;

pub fn calculate(order: &Order, options: RefundOptions, reason: &str) -> AppResult<RefundResult> {
    if order.status.is_terminal() {
        return Err(AppError::invalid_state(
            ErrorCode::RefundNotAllowed,
            format!("Refunds cannot be computed for a {} order", order.status),
        )
        .with_detail("orderId", order.id));
    }

    let points_to_refund = if options.refund_points {
        order.payment.points_used.max(0)
    } else {
        0
    };

    let money = if options.refund_money {
        order.payment.money_paid.max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let money_refund = (money > Decimal::ZERO).then(|| MoneyRefundRequest {
        order_id: order.id,
        amount: money,
        reason: reason.to_string(),
    });

    Ok(RefundResult {
        order_id: order.id,
        points_to_refund,
        money_refund,
        cashback_to_revoke: order.payment.cashback_earned.max(Decimal::ZERO),
        items: allocate(order, points_to_refund, money),
    })
}

/// 行权重：优先金额，其次积分，最后数量
fn weights(order: &Order) -> Vec<Decimal> {
    let by_value: Vec<Decimal> = order.items.iter().map(|i| i.line_total()).collect();
    if by_value.iter().any(|w| w.is_sign_positive() && !w.is_zero()) {
        return by_value;
    }
    let by_points: Vec<Decimal> = order
        .items
        .iter()
        .map(|i| Decimal::from(i.line_points()))
        .collect();
    if by_points.iter().any(|w| w.is_sign_positive() && !w.is_zero()) {
        return by_points;
    }
    order
        .items
        .iter()
        .map(|i| Decimal::from(i.quantity.max(1)))
        .collect()
}

fn allocate(order: &Order, points: i64, money: Decimal) -> Vec<ItemRefund> {
    if order.items.is_empty() {
        return Vec::new();
    }

    let weights = weights(order);
    let total_weight: Decimal = weights.iter().copied().sum();
    let last = order.items.len() - 1;

    let mut points_left = points;
    let mut money_left = money;
    let mut refunds = Vec::with_capacity(order.items.len());

    for (index, (item, weight)) in order.items.iter().zip(weights).enumerate() {
        let (item_points, item_money) = if index == last {
            (points_left, money_left)
        } else {
            let ratio = weight / total_weight;
            let p = (Decimal::from(points) * ratio)
                .floor()
                .to_i64()
                .unwrap_or(0);
            let m = (money * ratio)
                .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::ToZero);
            (p, m)
        };
        points_left -= item_points;
        money_left -= item_money;

        refunds.push(ItemRefund {
            item_id: item.id,
            product_name: item.product_name.clone(),
            points: item_points,
            money: item_money,
        });
    }

    refunds
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        ItemType, OrderItem, OrderSource, OrderStatus, PaymentBreakdown, PickupInfo,
    };

    fn item(id: i64, price_cents: i64, quantity: i32, points: i64) -> OrderItem {
        OrderItem {
            id,
            order_id: 1,
            product_name: format!("item-{id}"),
            product_image: None,
            item_type: ItemType::Regular,
            quantity,
            unit_price: Decimal::new(price_cents, 2),
            unit_points: points,
            voucher_code: None,
            voucher_used: false,
            voucher_used_at: None,
            voucher_used_by: None,
            voucher_expires_at: None,
            created_at: 0,
        }
    }

    fn order(status: OrderStatus, points: i64, money_cents: i64, items: Vec<OrderItem>) -> Order {
        Order {
            id: 1,
            code: "PED-1".into(),
            user_id: 9,
            status,
            source: OrderSource::App,
            payment: PaymentBreakdown {
                points_used: points,
                money_paid: Decimal::new(money_cents, 2),
                cashback_earned: Decimal::new(150, 2),
            },
            pickup: PickupInfo::default(),
            items,
            timeline: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_full_refund() {
        let o = order(OrderStatus::Confirmed, 500, 2000, vec![item(1, 1000, 2, 0)]);
        let r = calculate(&o, RefundOptions::default(), "cliente desistiu").unwrap();
        assert_eq!(r.points_to_refund, 500);
        let money = r.money_refund.unwrap();
        assert_eq!(money.amount, Decimal::new(2000, 2));
        assert_eq!(money.reason, "cliente desistiu");
        assert_eq!(r.cashback_to_revoke, Decimal::new(150, 2));
    }

    #[test]
    fn test_flags_switch_parts_off() {
        let o = order(OrderStatus::Pending, 500, 2000, vec![item(1, 1000, 2, 0)]);
        let options = RefundOptions {
            refund_points: false,
            refund_money: false,
        };
        let r = calculate(&o, options, "x").unwrap();
        assert_eq!(r.points_to_refund, 0);
        assert!(r.money_refund.is_none());
        assert_eq!(r.cashback_to_revoke, Decimal::new(150, 2));
    }

    #[test]
    fn test_points_only_order_has_no_money_request() {
        let o = order(OrderStatus::Pending, 800, 0, vec![item(1, 0, 1, 800)]);
        let r = calculate(&o, RefundOptions::default(), "x").unwrap();
        assert_eq!(r.points_to_refund, 800);
        assert!(r.money_refund.is_none());
        assert_eq!(r.items[0].points, 800);
    }

    #[test]
    fn test_terminal_order_is_refused() {
        for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
            let o = order(status, 100, 100, vec![]);
            let err = calculate(&o, RefundOptions::default(), "x").unwrap_err();
            assert_eq!(err.code, ErrorCode::RefundNotAllowed);
            assert!(err.is_invalid_state());
        }
    }

    #[test]
    fn test_breakdown_sums_exactly() {
        // 10.00 金额与 100 积分按 10.00 / 10.00 / 10.00 分摊
        let o = order(
            OrderStatus::Confirmed,
            100,
            1000,
            vec![item(1, 1000, 1, 0), item(2, 1000, 1, 0), item(3, 1000, 1, 0)],
        );
        let r = calculate(&o, RefundOptions::default(), "x").unwrap();
        let points: i64 = r.items.iter().map(|i| i.points).sum();
        let money: Decimal = r.items.iter().map(|i| i.money).sum();
        assert_eq!(points, 100);
        assert_eq!(money, Decimal::new(1000, 2));
        assert_eq!(r.items[0].points, 33);
        assert_eq!(r.items[0].money, Decimal::new(333, 2));
        assert_eq!(r.items[2].points, 34);
        assert_eq!(r.items[2].money, Decimal::new(334, 2));
    }

    #[test]
    fn test_breakdown_is_proportional_to_line_value() {
        let o = order(
            OrderStatus::Pending,
            0,
            4000,
            vec![item(1, 1000, 3, 0), item(2, 1000, 1, 0)],
        );
        let r = calculate(&o, RefundOptions::default(), "x").unwrap();
        assert_eq!(r.items[0].money, Decimal::new(3000, 2));
        assert_eq!(r.items[1].money, Decimal::new(1000, 2));
    }
}
