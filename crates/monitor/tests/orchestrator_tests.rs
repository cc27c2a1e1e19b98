//! Integration tests for [`HealthOrchestrator`] polling cycles.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{orchestrator_with, FailingSink, RecordingSink, ScriptedParam};
use healthwatch_core::checks::CHECK_IS_BROKEN;
use healthwatch_core::{HealthStatus, HistoryResult, MonitorConfig};
use healthwatch_events::LogSink;
use healthwatch_monitor::{HealthOrchestrator, MonitorError};

// ---------------------------------------------------------------------------
// Test: update records one entry per parameter
// ---------------------------------------------------------------------------

/// A failing parameter gets an `Unknown` entry and does not keep the other
/// parameter from being recorded.
#[tokio::test]
async fn failing_update_is_recorded_as_unknown_without_blocking_others() {
    let orchestrator = orchestrator_with(Arc::new(LogSink));
    orchestrator.register(ScriptedParam::failing("rpc"));
    orchestrator.register(ScriptedParam::new("balance", HealthStatus::Unstable));

    orchestrator.update().await.unwrap();

    let rpc = orchestrator.history_snapshot("rpc").await;
    assert_eq!(rpc.len(), 1);
    assert_eq!(rpc[0].result, HistoryResult::Unknown);

    let balance = orchestrator.history_snapshot("balance").await;
    assert_eq!(balance.len(), 1);
    assert_eq!(balance[0].result, HistoryResult::Unstable);

    let errors = orchestrator.trial_errors().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].param_id, "rpc");
    assert_eq!(errors[0].message, "rpc endpoint unreachable");
    assert!(errors[0].time.is_some());
}

#[tokio::test]
async fn update_param_touches_only_that_parameter() {
    let orchestrator = orchestrator_with(Arc::new(LogSink));
    orchestrator.register(ScriptedParam::new("a", HealthStatus::Healthy));
    orchestrator.register(ScriptedParam::new("b", HealthStatus::Healthy));

    orchestrator.update_param("a").await.unwrap();

    assert_eq!(orchestrator.history_snapshot("a").await.len(), 1);
    assert!(orchestrator.history_snapshot("b").await.is_empty());
}

#[tokio::test]
async fn history_observers_see_every_append() {
    let orchestrator = orchestrator_with(Arc::new(LogSink));
    let appends = Arc::new(AtomicUsize::new(0));
    {
        let appends = Arc::clone(&appends);
        orchestrator
            .on_history_update(move |_, _| {
                appends.fetch_add(1, Ordering::SeqCst);
            })
            .await;
    }
    orchestrator.register(ScriptedParam::new("a", HealthStatus::Healthy));
    orchestrator.register(ScriptedParam::failing("b"));

    orchestrator.update().await.unwrap();
    orchestrator.update().await.unwrap();

    assert_eq!(appends.load(Ordering::SeqCst), 4);
}

/// With zero retention every cycle purges all but the newest entry before
/// appending its own.
#[tokio::test]
async fn cleanup_runs_before_each_cycle_appends() {
    let config = MonitorConfig {
        history_retention_threshold_secs: 0,
        ..MonitorConfig::default()
    };
    let orchestrator = HealthOrchestrator::new(&config, Arc::new(LogSink)).unwrap();
    let param = ScriptedParam::new("disk", HealthStatus::Healthy);
    orchestrator.register(param.clone());

    for _ in 0..3 {
        orchestrator.update().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    param.set_status(HealthStatus::Unstable);
    orchestrator.update().await.unwrap();

    let history = orchestrator.history_snapshot("disk").await;
    let results: Vec<_> = history.iter().map(|e| e.result).collect();
    assert_eq!(results, vec![HistoryResult::Healthy, HistoryResult::Unstable]);
    assert!(history[0].timestamp < history[1].timestamp);
}

// ---------------------------------------------------------------------------
// Test: notifications across cycles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn break_and_recovery_are_notified_once_each() {
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = orchestrator_with(sink.clone());
    let param = ScriptedParam::new("bridge", HealthStatus::Healthy);
    orchestrator.register(param.clone());

    orchestrator.update().await.unwrap();
    param.set_status(HealthStatus::Broken);
    orchestrator.update().await.unwrap();
    orchestrator.update().await.unwrap();
    param.set_status(HealthStatus::Healthy);
    orchestrator.update().await.unwrap();

    assert_eq!(
        sink.titles(),
        vec!["Broken: Param bridge", "Now Healthy: Param bridge"]
    );

    let history = orchestrator.history_snapshot("bridge").await;
    assert_eq!(history.len(), 4);
    assert!(history[1].is_notified());
    assert!(!history[2].is_notified());
    assert!(history[3].is_notified());
}

// ---------------------------------------------------------------------------
// Test: failure aggregation
// ---------------------------------------------------------------------------

/// Notification failures of every parameter come back as one flat list,
/// and every parameter's history is still updated.
#[tokio::test]
async fn notification_failures_are_flattened_across_parameters() {
    let orchestrator = orchestrator_with(Arc::new(FailingSink));
    orchestrator.register(ScriptedParam::new("a", HealthStatus::Broken));
    orchestrator.register(ScriptedParam::new("b", HealthStatus::Broken));
    orchestrator.register(ScriptedParam::new("c", HealthStatus::Healthy));

    let err = orchestrator.update().await.unwrap_err();

    let failures = assert_matches!(err, MonitorError::Notifications(failures) => failures);
    assert_eq!(failures.len(), 2);
    let mut param_ids: Vec<_> = failures.iter().map(|f| f.param_id.as_str()).collect();
    param_ids.sort_unstable();
    assert_eq!(param_ids, vec!["a", "b"]);
    assert!(failures.iter().all(|f| f.check_id == CHECK_IS_BROKEN));

    for id in ["a", "b", "c"] {
        assert_eq!(orchestrator.history_snapshot(id).await.len(), 1);
    }
}

// ---------------------------------------------------------------------------
// Test: registration races
// ---------------------------------------------------------------------------

/// A parameter unregistered while its update is in flight is skipped by
/// the dispatcher instead of failing the cycle.
#[tokio::test]
async fn unregister_during_update_skips_notifications() {
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = orchestrator_with(sink.clone());
    orchestrator.register(ScriptedParam::slow(
        "slow",
        HealthStatus::Broken,
        Duration::from_millis(100),
    ));

    let cycle = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.update().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(orchestrator.unregister("slow"));

    cycle.await.unwrap().unwrap();
    assert!(sink.titles().is_empty());
}

/// History outlives registration: a parameter registered again under the
/// same id is not re-notified for a break already reported.
#[tokio::test]
async fn reregistered_param_keeps_its_notified_history() {
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = orchestrator_with(sink.clone());
    let param = ScriptedParam::new("bridge", HealthStatus::Broken);
    orchestrator.register(param.clone());
    orchestrator.update().await.unwrap();

    assert!(orchestrator.unregister("bridge"));
    let history = orchestrator.history_snapshot("bridge").await;
    assert_eq!(history.len(), 1);
    assert!(history[0].is_notified());

    orchestrator.register(param);
    orchestrator.update().await.unwrap();

    assert_eq!(sink.titles(), vec!["Broken: Param bridge"]);
    assert_eq!(orchestrator.history_snapshot("bridge").await.len(), 2);
}

// ---------------------------------------------------------------------------
// Test: queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overall_status_is_the_worst_parameter_status() {
    let orchestrator = orchestrator_with(Arc::new(LogSink));
    orchestrator.register(ScriptedParam::new("a", HealthStatus::Healthy));
    assert_eq!(orchestrator.overall_health_status().await, HealthStatus::Healthy);

    orchestrator.register(ScriptedParam::new("b", HealthStatus::Unstable));
    assert_eq!(orchestrator.overall_health_status().await, HealthStatus::Unstable);

    orchestrator.register(ScriptedParam::new("c", HealthStatus::Broken));
    orchestrator.register(ScriptedParam::new("d", HealthStatus::Unstable));
    assert_eq!(orchestrator.overall_health_status().await, HealthStatus::Broken);
}

#[tokio::test]
async fn reports_follow_registration_order() {
    let orchestrator = orchestrator_with(Arc::new(LogSink));
    orchestrator.register(ScriptedParam::new("first", HealthStatus::Healthy));
    orchestrator.register(ScriptedParam::new("second", HealthStatus::Broken));

    orchestrator.update().await.unwrap();
    let reports = orchestrator.health_status().await;

    let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert_eq!(reports[1].status, HealthStatus::Broken);
    assert_eq!(reports[1].details.as_deref(), Some("second is Broken"));
    assert!(reports[0].last_check.is_some());

    let single = orchestrator.health_status_with_param_id("second").await.unwrap();
    assert_eq!(single.title, "Param second");
    assert!(orchestrator.health_status_with_param_id("missing").await.is_none());
}
