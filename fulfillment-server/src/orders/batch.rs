//! 批量状态更新
//!
//! 每个 id 都是一次独立的 `update_status` 调用，单个失败只记录在结果里，
//! 不影响其它 id。目标为 CANCELLED 时每个订单都会计算退款。

use std::collections::HashSet;

use futures::StreamExt;
use shared::models::{Actor, BatchFailure, BatchOutcome, OrderStatus};

use super::OrderStatusMachine;

#[derive(Clone)]
pub struct BatchOperationCoordinator {
    machine: OrderStatusMachine,
    concurrency: usize,
}

impl BatchOperationCoordinator {
    pub fn new(machine: OrderStatusMachine, concurrency: usize) -> Self {
        Self {
            machine,
            concurrency: concurrency.max(1),
        }
    }

    /// 重复 id 只处理一次，结果保持请求顺序
    pub async fn batch_update_status(
        &self,
        order_ids: &[i64],
        target: OrderStatus,
        actor: Actor,
        notes: Option<String>,
    ) -> BatchOutcome {
        let mut seen = HashSet::with_capacity(order_ids.len());
        let ids: Vec<i64> = order_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut results: Vec<(usize, i64, Result<(), String>)> =
            futures::stream::iter(ids.iter().copied().enumerate())
                .map(|(index, order_id)| {
                    let notes = notes.clone();
                    async move {
                        let result = self
                            .machine
                            .update_status(order_id, target, actor, notes)
                            .await
                            .map(|_| ())
                            .map_err(|e| e.message);
                        (index, order_id, result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(index, _, _)| *index);

        let mut outcome = BatchOutcome {
            processed: results.len(),
            ..Default::default()
        };
        for (_, order_id, result) in results {
            match result {
                Ok(()) => outcome.succeeded.push(order_id),
                Err(error) => outcome.failed.push(BatchFailure { order_id, error }),
            }
        }

        tracing::info!(
            target_status = %target,
            processed = outcome.processed,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Batch status update finished"
        );
        outcome
    }
}
