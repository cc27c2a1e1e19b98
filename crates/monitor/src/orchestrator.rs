//! Parameter registry and polling-cycle orchestration.
//!
//! [`HealthOrchestrator`] owns the registered parameters, the shared
//! [`HistoryStore`] and the [`NotificationDispatcher`]. One call to
//! [`HealthOrchestrator::update`] is one polling cycle:
//!
//! 1. history cleanup, once;
//! 2. for every parameter concurrently: status update, history append,
//!    notification dispatch.
//!
//! Notification failures never stop other parameters; they are returned
//! together once the whole cycle has run.

use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use healthwatch_core::types::now_millis;
use healthwatch_core::{
    HealthParam, HealthStatus, HistoryEntry, HistoryStore, MonitorConfig, NotificationCheck,
    ParamHealthReport, TrackedParam,
};
use healthwatch_events::{
    DispatchError, NotificationDispatcher, NotificationSink, ParamLookup, SharedHistory,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{MonitorError, MonitorResult};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registered parameters in registration order.
///
/// Guarded by a synchronous lock because the dispatcher resolves parameters
/// from a plain closure. Critical sections never await.
#[derive(Default)]
struct ParamRegistry {
    params: RwLock<Vec<Arc<TrackedParam>>>,
}

impl ParamRegistry {
    fn insert(&self, param: Arc<TrackedParam>) -> bool {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        match params.iter().position(|p| p.id() == param.id()) {
            Some(index) => {
                params[index] = param;
                true
            }
            None => {
                params.push(param);
                false
            }
        }
    }

    fn remove(&self, param_id: &str) -> bool {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        let before = params.len();
        params.retain(|p| p.id() != param_id);
        params.len() != before
    }

    fn get(&self, param_id: &str) -> Option<Arc<TrackedParam>> {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id() == param_id)
            .cloned()
    }

    fn snapshot(&self) -> Vec<Arc<TrackedParam>> {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// The last failed status update of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialError {
    pub param_id: String,
    pub message: String,
    pub time: Option<healthwatch_core::types::Timestamp>,
}

// ---------------------------------------------------------------------------
// HealthOrchestrator
// ---------------------------------------------------------------------------

pub struct HealthOrchestrator {
    registry: Arc<ParamRegistry>,
    history: SharedHistory,
    dispatcher: NotificationDispatcher,
}

impl HealthOrchestrator {
    /// Create an orchestrator with the built-in checks registered.
    ///
    /// Fails when `config` does not validate.
    pub fn new(config: &MonitorConfig, sink: Arc<dyn NotificationSink>) -> MonitorResult<Self> {
        let mut orchestrator = Self::without_checks(config, sink)?;
        for check in NotificationCheck::defaults(config) {
            orchestrator.dispatcher.register_check(check);
        }
        Ok(orchestrator)
    }

    /// Create an orchestrator with no notification checks registered.
    pub fn without_checks(
        config: &MonitorConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> MonitorResult<Self> {
        config.validate()?;

        let registry = Arc::new(ParamRegistry::default());
        let history: SharedHistory =
            Arc::new(Mutex::new(HistoryStore::new(config.history_retention())));

        let lookup: ParamLookup = {
            let registry = Arc::clone(&registry);
            Arc::new(move |param_id: &str| registry.get(param_id))
        };
        let dispatcher = NotificationDispatcher::new(sink, Arc::clone(&history), lookup);

        Ok(Self {
            registry,
            history,
            dispatcher,
        })
    }

    /// The dispatcher, for registering extra checks or notified handlers.
    pub fn dispatcher_mut(&mut self) -> &mut NotificationDispatcher {
        &mut self.dispatcher
    }

    /// Register an observer run after every history append.
    pub async fn on_history_update<F>(&self, handler: F)
    where
        F: Fn(&str, &[HistoryEntry]) + Send + Sync + 'static,
    {
        self.history.lock().await.on_update(handler);
    }

    // -- Registration ------------------------------------------------------

    /// Register a parameter, replacing any parameter with the same id.
    pub fn register(&self, param: Arc<dyn HealthParam>) {
        let tracked = Arc::new(TrackedParam::new(param));
        let param_id = tracked.id().to_string();
        if self.registry.insert(tracked) {
            tracing::info!(param_id = %param_id, "Replaced health parameter");
        } else {
            tracing::info!(param_id = %param_id, "Registered health parameter");
        }
    }

    /// Unregister a parameter. Its history is kept, so registering the same
    /// id again resumes from the recorded notifications.
    ///
    /// Returns `false` when no parameter had this id.
    pub fn unregister(&self, param_id: &str) -> bool {
        let removed = self.registry.remove(param_id);
        if removed {
            tracing::info!(param_id, "Unregistered health parameter");
        }
        removed
    }

    /// Ids of all registered parameters, in registration order.
    pub fn param_ids(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    // -- Updates -----------------------------------------------------------

    /// Run one polling cycle over every registered parameter.
    pub async fn update(&self) -> MonitorResult<()> {
        self.history.lock().await.cleanup();

        let params = self.registry.snapshot();
        let results = join_all(params.iter().map(|param| self.process(param))).await;

        let failures: Vec<_> = results
            .into_iter()
            .filter_map(Result::err)
            .flat_map(|err| err.failures)
            .collect();

        tracing::debug!(
            params = params.len(),
            failures = failures.len(),
            "Health update cycle complete"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(MonitorError::Notifications(failures))
        }
    }

    /// Update a single parameter and dispatch its notifications.
    ///
    /// An id that is not registered is skipped.
    pub async fn update_param(&self, param_id: &str) -> MonitorResult<()> {
        let Some(param) = self.registry.get(param_id) else {
            tracing::debug!(param_id, "Skipping update of unregistered parameter");
            return Ok(());
        };
        self.process(&param).await.map_err(MonitorError::from)
    }

    /// Update, append, dispatch, strictly in that order.
    async fn process(&self, param: &TrackedParam) -> Result<(), DispatchError> {
        let param_id = param.id();

        let entry = match param.update().await {
            Ok(updated_at) => {
                let status = param.health_status().await;
                tracing::debug!(param_id, %status, "Parameter updated");
                HistoryEntry::new(status.into(), updated_at.timestamp_millis())
            }
            Err(e) => {
                tracing::warn!(param_id, error = %e, "Parameter update failed, recording unknown result");
                let failed_at = param
                    .last_trial_error_time()
                    .await
                    .map(|t| t.timestamp_millis())
                    .unwrap_or_else(now_millis);
                HistoryEntry::unknown(failed_at)
            }
        };

        let history = self.history.lock().await.append(param_id, entry).to_vec();

        self.dispatcher
            .send_notifications(param_id, &history)
            .await
            .map(|_| ())
    }

    // -- Queries -----------------------------------------------------------

    /// Reports for every registered parameter, in registration order.
    pub async fn health_status(&self) -> Vec<ParamHealthReport> {
        let mut reports = Vec::new();
        for param in self.registry.snapshot() {
            reports.push(param.report().await);
        }
        reports
    }

    pub async fn health_status_with_param_id(&self, param_id: &str) -> Option<ParamHealthReport> {
        match self.registry.get(param_id) {
            Some(param) => Some(param.report().await),
            None => None,
        }
    }

    /// The worst live status of all parameters; `Healthy` when none are
    /// registered.
    pub async fn overall_health_status(&self) -> HealthStatus {
        let mut overall = HealthStatus::Healthy;
        for param in self.registry.snapshot() {
            overall = overall.max(param.health_status().await);
        }
        overall
    }

    /// The last update error of every parameter that has one.
    pub async fn trial_errors(&self) -> Vec<TrialError> {
        let mut errors = Vec::new();
        for param in self.registry.snapshot() {
            if let Some(message) = param.last_trial_error_message().await {
                errors.push(TrialError {
                    param_id: param.id().to_string(),
                    message,
                    time: param.last_trial_error_time().await,
                });
            }
        }
        errors
    }

    /// Copy of a parameter's current history; empty when never seen.
    pub async fn history_snapshot(&self, param_id: &str) -> Vec<HistoryEntry> {
        self.history.lock().await.param_history(param_id).to_vec()
    }
}
