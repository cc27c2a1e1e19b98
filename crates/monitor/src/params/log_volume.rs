//! Log-volume health parameter.
//!
//! [`LogVolumeParam`] counts log events of one level inside a sliding time
//! window. It is fed by [`LogVolumeLayer`], a `tracing_subscriber` layer
//! installed next to the fmt layer. When more events than allowed occurred
//! inside the window, the parameter reports its configured unhealthy status.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use healthwatch_core::config::duration_millis;
use healthwatch_core::types::now_millis;
use healthwatch_core::{BoxError, HealthParam, HealthStatus};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Events from this target are never counted: they report notifications
/// about this very parameter.
const NOTIFICATION_LOG_TARGET: &str = "healthwatch_events::delivery::log";

#[derive(Debug, Default)]
struct LogWindow {
    times: VecDeque<i64>,
    last_message: String,
}

/// Counts log events of a single level.
pub struct LogVolumeParam {
    id: String,
    level: Level,
    unhealthy_status: HealthStatus,
    max_allowed: usize,
    window: Duration,
    state: Mutex<LogWindow>,
}

impl LogVolumeParam {
    pub fn new(level: Level, unhealthy_status: HealthStatus, max_allowed: usize, window: Duration) -> Self {
        Self {
            id: format!("{}_logs", level_name(level)),
            level,
            unhealthy_status,
            max_allowed,
            window,
            state: Mutex::new(LogWindow::default()),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// A layer feeding this parameter.
    pub fn layer(self: &Arc<Self>) -> LogVolumeLayer {
        LogVolumeLayer {
            param: Arc::clone(self),
        }
    }

    /// Record one event of the watched level.
    pub fn record(&self, message: impl Into<String>) {
        self.record_at(now_millis(), message);
    }

    fn record_at(&self, timestamp: i64, message: impl Into<String>) {
        let mut state = self.lock();
        state.times.push_back(timestamp);
        state.last_message = message.into();
    }

    /// Drop events that fell out of the window ending at `now_ms`.
    fn prune_at(&self, now_ms: i64) {
        let first = now_ms.saturating_sub(duration_millis(self.window));
        let mut state = self.lock();
        while state.times.front().is_some_and(|t| *t <= first) {
            state.times.pop_front();
        }
    }

    /// Number of events currently counted.
    pub fn count(&self) -> usize {
        self.lock().times.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogWindow> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_exceeded(&self) -> bool {
        self.count() > self.max_allowed
    }
}

#[async_trait]
impl HealthParam for LogVolumeParam {
    fn id(&self) -> &str {
        &self.id
    }

    async fn title(&self) -> String {
        format!("{} in Logs", capitalized(self.level))
    }

    async fn description(&self) -> String {
        format!("Number of {} lines in Logs.", capitalized(self.level))
    }

    async fn details(&self) -> Option<String> {
        let state = self.lock();
        (state.times.len() > self.max_allowed).then(|| {
            format!(
                "There are {} {}s in logs. The last one is \"{}\".",
                state.times.len(),
                level_name(self.level),
                state.last_message
            )
        })
    }

    async fn update_status(&self) -> Result<(), BoxError> {
        self.prune_at(now_millis());
        Ok(())
    }

    async fn health_status(&self) -> HealthStatus {
        if self.is_exceeded() {
            self.unhealthy_status
        } else {
            HealthStatus::Healthy
        }
    }
}

fn level_name(level: Level) -> String {
    level.as_str().to_lowercase()
}

fn capitalized(level: Level) -> String {
    let name = level_name(level);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// Feeds events of the parameter's level into a [`LogVolumeParam`].
pub struct LogVolumeLayer {
    param: Arc<LogVolumeParam>,
}

impl<S: Subscriber> Layer<S> for LogVolumeLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != self.param.level || metadata.target() == NOTIFICATION_LOG_TARGET {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.param.record(visitor.message);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
