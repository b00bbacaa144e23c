//! 通知文案 (pt-BR)

use serde_json::json;
use shared::models::{
    NewNotification, NotificationCategory, NotificationKind, Order, OrderStatus, RefundResult,
    Voucher,
};

pub fn voucher_used(voucher: &Voucher) -> NewNotification {
    NewNotification {
        user_id: voucher.owner_id(),
        kind: NotificationKind::VoucherUsed,
        category: NotificationCategory::Voucher,
        title: "Voucher Utilizado".to_string(),
        body: format!(
            "Seu voucher de {} foi utilizado com sucesso.",
            voucher.item.product_name
        ),
        data: json!({
            "voucherCode": voucher.code(),
            "orderId": voucher.order.id,
            "orderCode": voucher.order.code,
            "usedAt": voucher.item.voucher_used_at,
        }),
    }
}

/// `days_remaining` 向上取整，1 表示 24 小时内到期 (可能就在今天)
pub fn voucher_expiring(voucher: &Voucher, days_remaining: i64) -> NewNotification {
    let when = match days_remaining {
        d if d <= 1 => "em menos de 24 horas".to_string(),
        d => format!("em {d} dias"),
    };
    NewNotification {
        user_id: voucher.owner_id(),
        kind: NotificationKind::VoucherExpiring,
        category: NotificationCategory::Voucher,
        title: "Voucher Expirando".to_string(),
        body: format!(
            "Seu voucher de {} expira {}. Não deixe de utilizá-lo!",
            voucher.item.product_name, when
        ),
        data: json!({
            "voucherCode": voucher.code(),
            "orderId": voucher.order.id,
            "expiresAt": voucher.item.voucher_expires_at,
            "daysRemaining": days_remaining,
        }),
    }
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pendente",
        OrderStatus::Confirmed => "confirmado",
        OrderStatus::Ready => "pronto para retirada",
        OrderStatus::Completed => "concluído",
        OrderStatus::Cancelled => "cancelado",
    }
}

pub fn order_status_changed(order: &Order) -> NewNotification {
    NewNotification {
        user_id: order.user_id,
        kind: NotificationKind::OrderStatusChanged,
        category: NotificationCategory::Order,
        title: "Pedido Atualizado".to_string(),
        body: format!(
            "Seu pedido {} está {}.",
            order.code,
            status_label(order.status)
        ),
        data: json!({
            "orderId": order.id,
            "orderCode": order.code,
            "status": order.status,
        }),
    }
}

pub fn order_cancelled(order: &Order, reason: &str, refunds: &RefundResult) -> NewNotification {
    NewNotification {
        user_id: order.user_id,
        kind: NotificationKind::OrderCancelled,
        category: NotificationCategory::Order,
        title: "Pedido Cancelado".to_string(),
        body: format!("Seu pedido {} foi cancelado. Motivo: {}", order.code, reason),
        data: json!({
            "orderId": order.id,
            "orderCode": order.code,
            "pointsRefunded": refunds.points_to_refund,
            "moneyRefunded": refunds.money_amount(),
        }),
    }
}
