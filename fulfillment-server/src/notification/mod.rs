//! 用户通知
//!
//! 业务层只决定通知内容，投递交给 [`NotificationDispatcher`]：
//!
//! - [`LogDispatcher`] - 写入日志 (默认)
//! - [`WebhookDispatcher`] - POST 到外部通知服务
//! - [`QueuedDispatcher`] - 位于两者之前的有界队列，由 [`NotificationWorker`] 消费
//!
//! 投递不影响业务结果：调用方统一走 [`notify_best_effort`]，失败只记日志。

mod log;
pub mod messages;
mod queue;
mod webhook;

pub use log::LogDispatcher;
pub use queue::{NotificationWorker, QueuedDispatcher};
pub use webhook::WebhookDispatcher;

use async_trait::async_trait;
use shared::models::NewNotification;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Notification transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<(), NotifyError>;
}

/// 把通知交给 `dispatcher`，失败只记日志
pub async fn notify_best_effort(dispatcher: &dyn NotificationDispatcher, notification: NewNotification) {
    let user_id = notification.user_id;
    let kind = notification.kind;
    if let Err(e) = dispatcher.create(notification).await {
        tracing::warn!(user_id, kind = ?kind, error = %e, "Notification dispatch failed");
    }
}
