//! Check evaluation and notification dispatch.
//!
//! [`NotificationDispatcher`] runs every registered [`NotificationCheck`]
//! against a parameter's freshly appended history. Eligible notifications
//! are sent concurrently through the injected [`NotificationSink`]; each
//! successful send tags the head of the parameter's history as `notified`
//! so later evaluations see the excursion as handled.

use std::sync::Arc;

use futures::future::join_all;
use healthwatch_core::{
    CheckContext, HistoryEntry, HistoryStore, Notification, NotificationCheck, Tag, TrackedParam,
};
use tokio::sync::Mutex;

use crate::sink::{NotificationSink, NotifyError};

/// History store shared between the orchestrator and the dispatcher.
pub type SharedHistory = Arc<Mutex<HistoryStore>>;

/// Resolves a parameter from its id; `None` once it has been unregistered.
pub type ParamLookup = Arc<dyn Fn(&str) -> Option<Arc<TrackedParam>> + Send + Sync>;

/// Called after a notification for a parameter was sent successfully.
pub type NotifiedHandler = Box<dyn Fn(&str, &Notification) + Send + Sync>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A single failed notification send.
#[derive(Debug, thiserror::Error)]
#[error("Check {check_id} failed to notify for parameter {param_id}: {source}")]
pub struct NotificationFailure {
    pub param_id: String,
    pub check_id: &'static str,
    pub source: NotifyError,
}

/// All notification failures of one dispatch round for a parameter.
#[derive(Debug, thiserror::Error)]
#[error("{} notification(s) failed for parameter {param_id}", .failures.len())]
pub struct DispatchError {
    pub param_id: String,
    pub failures: Vec<NotificationFailure>,
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

pub struct NotificationDispatcher {
    checks: Vec<NotificationCheck>,
    sink: Arc<dyn NotificationSink>,
    history: SharedHistory,
    lookup: ParamLookup,
    notified_handlers: Vec<NotifiedHandler>,
}

impl NotificationDispatcher {
    /// Create a dispatcher with no registered checks.
    pub fn new(sink: Arc<dyn NotificationSink>, history: SharedHistory, lookup: ParamLookup) -> Self {
        Self {
            checks: Vec::new(),
            sink,
            history,
            lookup,
            notified_handlers: Vec::new(),
        }
    }

    /// Add a check. Registration order is the order in which simultaneously
    /// eligible notifications are sent.
    pub fn register_check(&mut self, check: NotificationCheck) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> &[NotificationCheck] {
        &self.checks
    }

    /// Register an additional handler run after each successful send.
    pub fn on_notified<F>(&mut self, handler: F)
    where
        F: Fn(&str, &Notification) + Send + Sync + 'static,
    {
        self.notified_handlers.push(Box::new(handler));
    }

    /// Evaluate all checks against `history` and send the due notifications.
    ///
    /// A parameter that can no longer be resolved is skipped silently. A
    /// failed send does not stop the others; all failures are returned
    /// together once every send has been attempted. Returns the number of
    /// notifications sent.
    pub async fn send_notifications(
        &self,
        param_id: &str,
        history: &[HistoryEntry],
    ) -> Result<usize, DispatchError> {
        let Some(param) = (self.lookup)(param_id) else {
            tracing::debug!(param_id, "Parameter no longer registered, skipping notifications");
            return Ok(0);
        };

        let ctx = CheckContext {
            param: &param,
            history,
        };
        let eligible: Vec<_> = self
            .checks
            .iter()
            .map(|check| check.bind(ctx))
            .filter(|bound| bound.check())
            .collect();

        if eligible.is_empty() {
            return Ok(0);
        }

        let results = join_all(eligible.into_iter().map(|bound| async move {
            let notification = bound.notification().await;
            self.sink
                .notify(&notification)
                .await
                .map_err(|source| NotificationFailure {
                    param_id: param_id.to_string(),
                    check_id: bound.id(),
                    source,
                })?;
            self.mark_notified(param_id, bound.id(), notification).await;
            Ok::<(), NotificationFailure>(())
        }))
        .await;

        let mut sent = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(()) => sent += 1,
                Err(failure) => {
                    tracing::warn!(
                        param_id,
                        check_id = failure.check_id,
                        error = %failure.source,
                        "Notification send failed"
                    );
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(sent)
        } else {
            Err(DispatchError {
                param_id: param_id.to_string(),
                failures,
            })
        }
    }

    /// Run notified handlers and tag the head of the parameter's history.
    async fn mark_notified(&self, param_id: &str, check_id: &str, notification: Notification) {
        tracing::info!(
            param_id,
            check_id,
            severity = %notification.severity,
            title = %notification.title,
            "Notification sent"
        );

        for handler in &self.notified_handlers {
            handler(param_id, &notification);
        }

        self.history
            .lock()
            .await
            .tag(param_id, Tag::notified(&notification));
    }
}
