//! Notification delivery to an HTTP webhook.
//!
//! Each notification is POSTed as
//! `{"severity", "title", "description", "timestamp"}`. A failed attempt is
//! retried after 1 s, 2 s and 4 s; the error of the final attempt is
//! returned when all of them fail.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use healthwatch_core::Notification;
use serde::Serialize;

use crate::sink::{NotificationSink, NotifyError};

/// Backoff before each retry.
const BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Timeout of a single POST.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Network, DNS, timeout or client construction failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

/// Body posted for one notification.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    notification: &'a Notification,
    timestamp: chrono::DateTime<Utc>,
}

/// Sink posting every notification to one webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    backoff: Vec<Duration>,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            backoff: BACKOFF.to_vec(),
        })
    }

    /// Replace the retry schedule. An empty schedule means a single attempt.
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `notification`, retrying on failure.
    pub async fn deliver(&self, notification: &Notification) -> Result<(), WebhookError> {
        let payload = WebhookPayload {
            notification,
            timestamp: Utc::now(),
        };

        let mut delays = self.backoff.iter();
        let mut attempt = 1;
        loop {
            let err = match self.post(&payload).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            let Some(delay) = delays.next() else {
                tracing::error!(url = %self.url, attempt, error = %err, "Webhook delivery failed after all retries");
                return Err(err);
            };

            tracing::warn!(
                url = %self.url,
                attempt,
                retry_in_ms = delay.as_millis() as u64,
                error = %err,
                "Webhook delivery attempt failed, retrying"
            );
            tokio::time::sleep(*delay).await;
            attempt += 1;
        }
    }

    async fn post(&self, payload: &WebhookPayload<'_>) -> Result<(), WebhookError> {
        let status = self.client.post(&self.url).json(payload).send().await?.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(WebhookError::HttpStatus(status.as_u16()))
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        Ok(self.deliver(notification).await?)
    }
}

#[cfg(test)]
mod tests {
    use healthwatch_core::Severity;

    use super::*;

    #[test]
    fn sink_keeps_its_url() {
        let sink = WebhookSink::new("http://localhost:9/hook").unwrap();
        assert_eq!(sink.url(), "http://localhost:9/hook");
        assert_eq!(sink.backoff, BACKOFF.to_vec());
    }

    #[test]
    fn payload_flattens_the_notification() {
        let notification = Notification::new(Severity::Warning, "Unstable", "lagging");
        let payload = WebhookPayload {
            notification: &notification,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["title"], "Unstable");
        assert_eq!(json["description"], "lagging");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn http_status_error_names_the_code() {
        assert_eq!(WebhookError::HttpStatus(502).to_string(), "Webhook returned HTTP 502");
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_after_retries() {
        // Nothing is expected to answer HTTP on the discard port.
        let sink = WebhookSink::new("http://127.0.0.1:9/hook")
            .unwrap()
            .with_backoff(vec![Duration::from_millis(1)]);

        let result = sink
            .notify(&Notification::new(Severity::Error, "Broken", "down"))
            .await;

        assert!(matches!(result, Err(NotifyError::Webhook(WebhookError::Request(_)))));
    }
}
