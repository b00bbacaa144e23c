//! Receipt view of an order

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ItemType, Order, OrderStatus, PaymentBreakdown, PickupInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub unit_points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
}

/// What the member sees as proof of purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_code: String,
    pub status: OrderStatus,
    pub created_at: i64,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Decimal,
    pub payment: PaymentBreakdown,
    pub pickup: PickupInfo,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        let lines: Vec<ReceiptLine> = order
            .items
            .iter()
            .map(|item| ReceiptLine {
                product_name: item.product_name.clone(),
                item_type: item.item_type,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total(),
                unit_points: item.unit_points,
                voucher_code: item.voucher_code.clone(),
            })
            .collect();
        let subtotal = lines.iter().map(|line| line.line_total).sum();

        Self {
            order_code: order.code.clone(),
            status: order.status,
            created_at: order.created_at,
            lines,
            subtotal,
            payment: order.payment.clone(),
            pickup: order.pickup.clone(),
        }
    }
}
