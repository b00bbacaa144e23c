//! Webhook 投递

use async_trait::async_trait;
use shared::models::NewNotification;
use std::time::Duration;

use super::{NotificationDispatcher, NotifyError};

/// 把每条通知以 JSON POST 到固定 URL
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn create(&self, notification: NewNotification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Transport(format!(
                "Webhook responded with {status}"
            )));
        }
        tracing::debug!(user_id = notification.user_id, "Notification delivered to webhook");
        Ok(())
    }
}
