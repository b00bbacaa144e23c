//! Refund decision types
//!
//! Instructions only. Crediting points and reversing payments belong to the
//! ledger and payment collaborators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Order;

/// Caller flags for a cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOptions {
    #[serde(default = "default_true")]
    pub refund_points: bool,
    #[serde(default = "default_true")]
    pub refund_money: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RefundOptions {
    fn default() -> Self {
        Self {
            refund_points: true,
            refund_money: true,
        }
    }
}

/// Request for the payment collaborator to reverse a charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyRefundRequest {
    pub order_id: i64,
    pub amount: Decimal,
    pub reason: String,
}

/// Share of the refund attributed to one line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRefund {
    pub item_id: i64,
    pub product_name: String,
    pub points: i64,
    pub money: Decimal,
}

/// Refund decision for a cancelled order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub order_id: i64,
    pub points_to_refund: i64,
    pub money_refund: Option<MoneyRefundRequest>,
    /// Cashback granted for the order, to be taken back from the owner
    pub cashback_to_revoke: Decimal,
    pub items: Vec<ItemRefund>,
}

impl RefundResult {
    pub fn money_amount(&self) -> Decimal {
        self.money_refund
            .as_ref()
            .map(|request| request.amount)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.points_to_refund == 0 && self.money_refund.is_none() && self.cashback_to_revoke.is_zero()
    }
}

/// Cancelled order together with the refund instructions computed for it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationResult {
    pub order: Order,
    pub refunds: RefundResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_to_full_refund() {
        let options: RefundOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, RefundOptions::default());
        let options: RefundOptions = serde_json::from_str(r#"{"refundMoney": false}"#).unwrap();
        assert!(options.refund_points);
        assert!(!options.refund_money);
    }
}
