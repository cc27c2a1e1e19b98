//! The notification sink boundary.

use async_trait::async_trait;
use healthwatch_core::Notification;

use crate::delivery::webhook::WebhookError;

/// Error returned by a [`NotificationSink`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// The sink refused or failed to deliver the notification.
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Sends a notification somewhere outside the process.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
