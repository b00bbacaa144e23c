use async_trait::async_trait;
use shared::models::NewNotification;

use super::{NotificationDispatcher, NotifyError};

/// 只把通知写入日志的 dispatcher
#[derive(Debug, Clone, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn create(&self, notification: NewNotification) -> Result<(), NotifyError> {
        tracing::info!(
            target: "notification",
            user_id = notification.user_id,
            kind = ?notification.kind,
            category = ?notification.category,
            title = %notification.title,
            "{}",
            notification.body
        );
        Ok(())
    }
}
