//! Order item / Voucher Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::OrderStatus;

/// 商品行类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Regular,
    /// Redeemable benefit, carries a voucher code
    Voucher,
}

impl ItemType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemType::Regular => "REGULAR",
            ItemType::Voucher => "VOUCHER",
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(ItemType::Regular),
            "VOUCHER" => Ok(ItemType::Voucher),
            other => Err(format!("Unknown item type: {}", other)),
        }
    }
}

/// Order line item. VOUCHER-typed items are vouchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    /// Back-reference to the parent order
    pub order_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_points: i64,
    pub voucher_code: Option<String>,
    pub voucher_used: bool,
    pub voucher_used_at: Option<i64>,
    pub voucher_used_by: Option<i64>,
    /// None means the voucher never expires
    pub voucher_expires_at: Option<i64>,
    pub created_at: i64,
}

impl OrderItem {
    pub fn is_voucher(&self) -> bool {
        self.item_type == ItemType::Voucher
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn line_points(&self) -> i64 {
        self.unit_points * i64::from(self.quantity)
    }

    /// Past expiry at `now`. A missing expiry never counts as expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.voucher_expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Parent order fields embedded into a voucher lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherOrderRef {
    pub id: i64,
    pub code: String,
    pub user_id: i64,
    pub status: OrderStatus,
}

/// Voucher item joined with its parent order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    #[serde(flatten)]
    pub item: OrderItem,
    pub order: VoucherOrderRef,
}

impl Voucher {
    pub fn code(&self) -> &str {
        self.item.voucher_code.as_deref().unwrap_or_default()
    }

    pub fn owner_id(&self) -> i64 {
        self.order.user_id
    }
}

/// Voucher as listed to its owner, with read-time expiry flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVoucher {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub is_expired: bool,
}

/// Outcome of validating a voucher code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<i64>,
    pub voucher: Voucher,
}

/// Filters of the member voucher list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherListOptions {
    #[serde(default)]
    pub include_used: bool,
    #[serde(default)]
    pub include_expired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(expires_at: Option<i64>) -> OrderItem {
        OrderItem {
            id: 1,
            order_id: 10,
            product_name: "Café".to_string(),
            product_image: None,
            item_type: ItemType::Voucher,
            quantity: 2,
            unit_price: Decimal::new(1250, 2),
            unit_points: 100,
            voucher_code: Some("V-1".to_string()),
            voucher_used: false,
            voucher_used_at: None,
            voucher_used_by: None,
            voucher_expires_at: expires_at,
            created_at: 0,
        }
    }

    #[test]
    fn test_null_expiry_never_expires() {
        assert!(!item(None).is_expired_at(i64::MAX));
    }

    #[test]
    fn test_expiry_is_strictly_before_now() {
        assert!(item(Some(999)).is_expired_at(1000));
        assert!(!item(Some(1000)).is_expired_at(1000));
    }

    #[test]
    fn test_line_values() {
        let it = item(None);
        assert_eq!(it.line_total(), Decimal::new(2500, 2));
        assert_eq!(it.line_points(), 200);
    }

    #[test]
    fn test_voucher_serializes_flat_with_order() {
        let voucher = Voucher {
            item: item(None),
            order: VoucherOrderRef {
                id: 10,
                code: "PED-1".to_string(),
                user_id: 7,
                status: OrderStatus::Confirmed,
            },
        };
        let json = serde_json::to_value(&voucher).unwrap();
        assert_eq!(json["voucherCode"], "V-1");
        assert_eq!(json["type"], "VOUCHER");
        assert_eq!(json["order"]["status"], "CONFIRMED");
        assert_eq!(voucher.code(), "V-1");
    }
}
