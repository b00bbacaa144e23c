//! 通知队列
//!
//! `QueuedDispatcher::create` 只负责入队，`NotificationWorker` 在后台把队列
//! 投递给真正的 dispatcher。队列满时入队方最多等待 `send_timeout`，
//! 超时才返回 [`NotifyError::QueueFull`]。

use async_trait::async_trait;
use shared::models::NewNotification;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio_util::sync::CancellationToken;

use super::{NotificationDispatcher, NotifyError};

#[derive(Debug, Clone)]
pub struct QueuedDispatcher {
    tx: mpsc::Sender<NewNotification>,
    send_timeout: Duration,
}

impl QueuedDispatcher {
    /// 返回 dispatcher 以及交给 Worker 的接收端
    pub fn new(
        capacity: usize,
        send_timeout: Duration,
    ) -> (Self, mpsc::Receiver<NewNotification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, send_timeout }, rx)
    }
}

#[async_trait]
impl NotificationDispatcher for QueuedDispatcher {
    async fn create(&self, notification: NewNotification) -> Result<(), NotifyError> {
        self.tx
            .send_timeout(notification, self.send_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => NotifyError::QueueFull,
                SendTimeoutError::Closed(_) => NotifyError::QueueClosed,
            })
    }
}

/// 通知后台 Worker
pub struct NotificationWorker {
    inner: Arc<dyn NotificationDispatcher>,
}

impl NotificationWorker {
    pub fn new(inner: Arc<dyn NotificationDispatcher>) -> Self {
        Self { inner }
    }

    /// 持续投递直到通道关闭或收到关闭信号，关闭时已入队的通知仍会投递
    pub async fn run(self, mut rx: mpsc::Receiver<NewNotification>, shutdown: CancellationToken) {
        tracing::info!("Notification worker started");

        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(notification) => self.deliver(notification).await,
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    rx.close();
                    while let Some(notification) = rx.recv().await {
                        self.deliver(notification).await;
                    }
                    break;
                }
            }
        }

        tracing::info!("Notification worker stopped");
    }

    async fn deliver(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        if let Err(e) = self.inner.create(notification).await {
            tracing::warn!(user_id, error = %e, "Failed to deliver notification");
        }
    }
}
