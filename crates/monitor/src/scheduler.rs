//! Periodic health polling.
//!
//! Runs [`HealthOrchestrator::update`] on a fixed interval using
//! `tokio::time::interval` until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::MonitorError;
use crate::orchestrator::HealthOrchestrator;

/// Run the polling loop.
///
/// The first cycle starts immediately. A failed cycle is logged and the
/// loop carries on with the next tick. Runs until `cancel` is triggered.
pub async fn run(orchestrator: Arc<HealthOrchestrator>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Health polling started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Health polling stopping");
                break;
            }
            _ = interval.tick() => {
                match orchestrator.update().await {
                    Ok(()) => tracing::debug!("Health polling cycle finished"),
                    Err(MonitorError::Notifications(failures)) => {
                        for failure in &failures {
                            tracing::error!(
                                param_id = %failure.param_id,
                                check_id = failure.check_id,
                                error = %failure.source,
                                "Notification failed"
                            );
                        }
                        tracing::error!(count = failures.len(), "Health polling cycle had notification failures");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Health polling cycle failed");
                    }
                }
            }
        }
    }
}
