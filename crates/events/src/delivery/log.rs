//! Notification delivery to the process log.

use async_trait::async_trait;
use healthwatch_core::{Notification, Severity};

use crate::sink::{NotificationSink, NotifyError};

/// Writes every notification as a structured log event.
///
/// Level follows severity: `error` for errors, `warn` for warnings,
/// `info` otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let Notification {
            severity,
            title,
            description,
        } = notification;

        match severity {
            Severity::Error => {
                tracing::error!(%severity, %title, %description, "Health notification")
            }
            Severity::Warning => {
                tracing::warn!(%severity, %title, %description, "Health notification")
            }
            Severity::Info | Severity::Success => {
                tracing::info!(%severity, %title, %description, "Health notification")
            }
        }

        Ok(())
    }
}
