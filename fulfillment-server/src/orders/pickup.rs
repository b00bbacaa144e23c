//! 取货校验
//!
//! 把柜台扫描或输入的码解析为订单。只读，完成订单需要另行调用。

use std::sync::Arc;

use shared::error::{AppError, AppResult};
use shared::models::{OrderStatus, PickupValidation};

use crate::db::repository::OrderStore;

#[derive(Clone)]
pub struct PickupValidator {
    store: Arc<dyn OrderStore>,
}

impl PickupValidator {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// 接受订单号或取货码，不区分大小写
    pub async fn validate_pickup(&self, code: &str) -> AppResult<PickupValidation> {
        let code = shared::util::normalize_code(code);
        if code.is_empty() {
            return Err(AppError::validation("Pickup code is required"));
        }

        let order = self
            .store
            .find_order_by_code(&code)
            .await?
            .ok_or_else(|| AppError::order_not_found(&code))?;

        let can_complete = order.status == OrderStatus::Ready;
        tracing::info!(
            order_id = order.id,
            status = %order.status,
            can_complete,
            "Pickup code validated"
        );

        Ok(PickupValidation {
            order_id: order.id,
            items_count: order.items_count(),
            order_code: order.code,
            owner_id: order.user_id,
            status: order.status,
            can_complete,
            pickup: order.pickup,
        })
    }
}
