//! Health-check parameter collaborator.
//!
//! Concrete parameters (balance checks, sync checks, log-volume checks, ...)
//! implement [`HealthParam`]. The orchestrator never talks to them directly;
//! it goes through [`TrackedParam`], which records when the last update
//! succeeded and why the last one failed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::types::{HealthStatus, Timestamp};

/// Error type returned by parameter status updates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single monitored aspect of the system.
#[async_trait]
pub trait HealthParam: Send + Sync {
    /// Stable, unique id.
    fn id(&self) -> &str;

    async fn title(&self) -> String;

    async fn description(&self) -> String;

    /// Detail text for an unhealthy status; `None` when there is nothing to
    /// report.
    async fn details(&self) -> Option<String>;

    /// Refresh the parameter's status from its data source.
    ///
    /// An error is the only signal of an unknown result.
    async fn update_status(&self) -> Result<(), BoxError>;

    /// The current live status.
    async fn health_status(&self) -> HealthStatus;
}

/// Serializable snapshot of a parameter's health for the query API.
#[derive(Debug, Clone, Serialize)]
pub struct ParamHealthReport {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: HealthStatus,
    pub last_check: Option<Timestamp>,
    pub last_trial_error: Option<String>,
    pub last_trial_error_time: Option<Timestamp>,
    pub details: Option<String>,
}

#[derive(Debug, Default)]
struct TrialState {
    last_updated: Option<Timestamp>,
    last_trial_error: Option<String>,
    last_trial_error_time: Option<Timestamp>,
}

/// A [`HealthParam`] plus update bookkeeping.
pub struct TrackedParam {
    inner: Arc<dyn HealthParam>,
    state: RwLock<TrialState>,
}

impl TrackedParam {
    pub fn new(inner: Arc<dyn HealthParam>) -> Self {
        Self {
            inner,
            state: RwLock::new(TrialState::default()),
        }
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    pub fn inner(&self) -> &Arc<dyn HealthParam> {
        &self.inner
    }

    pub async fn title(&self) -> String {
        self.inner.title().await
    }

    pub async fn description(&self) -> String {
        self.inner.description().await
    }

    pub async fn details(&self) -> Option<String> {
        self.inner.details().await
    }

    pub async fn health_status(&self) -> HealthStatus {
        self.inner.health_status().await
    }

    /// Run the parameter's status update and record the outcome.
    ///
    /// Returns the time the update completed, or the update error after
    /// recording its message and time.
    pub async fn update(&self) -> Result<Timestamp, BoxError> {
        match self.inner.update_status().await {
            Ok(()) => {
                let now = Utc::now();
                self.state.write().await.last_updated = Some(now);
                Ok(now)
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.last_trial_error = Some(e.to_string());
                state.last_trial_error_time = Some(Utc::now());
                Err(e)
            }
        }
    }

    pub async fn last_updated_time(&self) -> Option<Timestamp> {
        self.state.read().await.last_updated
    }

    pub async fn last_trial_error_message(&self) -> Option<String> {
        self.state.read().await.last_trial_error.clone()
    }

    pub async fn last_trial_error_time(&self) -> Option<Timestamp> {
        self.state.read().await.last_trial_error_time
    }

    /// Build a full health report for the query API.
    pub async fn report(&self) -> ParamHealthReport {
        let (last_check, last_trial_error, last_trial_error_time) = {
            let state = self.state.read().await;
            (
                state.last_updated,
                state.last_trial_error.clone(),
                state.last_trial_error_time,
            )
        };

        ParamHealthReport {
            id: self.id().to_string(),
            title: self.title().await,
            description: self.description().await,
            status: self.health_status().await,
            last_check,
            last_trial_error,
            last_trial_error_time,
            details: self.details().await,
        }
    }
}

impl std::fmt::Debug for TrackedParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedParam").field("id", &self.id()).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    struct FlakyParam {
        fail: AtomicBool,
    }

    #[async_trait]
    impl HealthParam for FlakyParam {
        fn id(&self) -> &str {
            "flaky"
        }
        async fn title(&self) -> String {
            "Flaky Param".into()
        }
        async fn description(&self) -> String {
            "Fails on demand".into()
        }
        async fn details(&self) -> Option<String> {
            None
        }
        async fn update_status(&self) -> Result<(), BoxError> {
            if self.fail.load(Ordering::SeqCst) {
                Err("explorer unreachable".into())
            } else {
                Ok(())
            }
        }
        async fn health_status(&self) -> HealthStatus {
            HealthStatus::Healthy
        }
    }

    fn tracked(fail: bool) -> (Arc<FlakyParam>, TrackedParam) {
        let inner = Arc::new(FlakyParam {
            fail: AtomicBool::new(fail),
        });
        let param = TrackedParam::new(inner.clone());
        (inner, param)
    }

    #[tokio::test]
    async fn successful_update_records_last_update_time() {
        let (_, param) = tracked(false);
        assert!(param.last_updated_time().await.is_none());

        let updated_at = param.update().await.expect("update should succeed");

        assert_eq!(param.last_updated_time().await, Some(updated_at));
        assert!(param.last_trial_error_message().await.is_none());
    }

    #[tokio::test]
    async fn failed_update_records_trial_error() {
        let (inner, param) = tracked(false);
        param.update().await.expect("first update should succeed");
        let first_update = param.last_updated_time().await;

        inner.fail.store(true, Ordering::SeqCst);
        let err = param.update().await.expect_err("update should fail");

        assert_eq!(err.to_string(), "explorer unreachable");
        assert_eq!(
            param.last_trial_error_message().await.as_deref(),
            Some("explorer unreachable")
        );
        assert!(param.last_trial_error_time().await.is_some());
        // A failure does not move the last successful update time.
        assert_eq!(param.last_updated_time().await, first_update);
    }

    #[tokio::test]
    async fn report_collects_param_fields() {
        let (_, param) = tracked(false);
        param.update().await.unwrap();

        let report = param.report().await;

        assert_eq!(report.id, "flaky");
        assert_eq!(report.title, "Flaky Param");
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.last_check.is_some());
        assert!(report.details.is_none());
    }
}
