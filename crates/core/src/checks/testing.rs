//! Fixtures for exercising notification checks.
//!
//! [`HistoryBuilder`] synthesizes history timelines step by step, and
//! [`dummy_param`] provides a parameter to bind checks against.

use std::sync::Arc;

use async_trait::async_trait;

use crate::param::{BoxError, HealthParam, TrackedParam};
use crate::types::{HealthStatus, HistoryEntry, HistoryResult, Notification, Severity, Tag};

/// Default difference between the timestamps of consecutive entries.
pub const HISTORY_ITEMS_INTERVAL_MS: i64 = 1_000;

pub const DUMMY_ID: &str = "dummy-param";
pub const DUMMY_TITLE: &str = "Dummy Param";

/// Notification stored in tags written by [`HistoryBuilder::push_notified`].
pub fn sample_notification() -> Notification {
    Notification::new(
        Severity::Error,
        format!("Broken: {DUMMY_TITLE}"),
        "sample description",
    )
}

/// Builds a chronological history one step at a time.
#[derive(Debug, Clone)]
pub struct HistoryBuilder {
    entries: Vec<HistoryEntry>,
    next_timestamp: i64,
    interval: i64,
}

impl HistoryBuilder {
    /// Start at timestamp 0 with [`HISTORY_ITEMS_INTERVAL_MS`] between entries.
    pub fn new() -> Self {
        Self::with_interval(HISTORY_ITEMS_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: i64) -> Self {
        Self {
            entries: Vec::new(),
            next_timestamp: 0,
            interval: interval_ms,
        }
    }

    /// Append an entry `delta_ms` after the previous step.
    pub fn step(mut self, result: HistoryResult, delta_ms: i64, tag: Option<Tag>) -> Self {
        let timestamp = match self.entries.last() {
            Some(_) => self.next_timestamp + delta_ms,
            None => self.next_timestamp,
        };
        self.entries.push(HistoryEntry {
            timestamp,
            result,
            tag,
        });
        self.next_timestamp = timestamp;
        self
    }

    /// Append an untagged entry one interval after the previous step.
    pub fn push(self, result: HistoryResult) -> Self {
        let interval = self.interval;
        self.step(result, interval, None)
    }

    /// Append an entry tagged as notified with [`sample_notification`].
    pub fn push_notified(self, result: HistoryResult) -> Self {
        let interval = self.interval;
        self.step(result, interval, Some(Tag::notified(&sample_notification())))
    }

    pub fn build(self) -> Vec<HistoryEntry> {
        self.entries
    }
}

impl Default for HistoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter with fixed metadata and no details.
#[derive(Debug, Default)]
pub struct DummyParam;

#[async_trait]
impl HealthParam for DummyParam {
    fn id(&self) -> &str {
        DUMMY_ID
    }

    async fn title(&self) -> String {
        DUMMY_TITLE.to_string()
    }

    async fn description(&self) -> String {
        "This is a dummy param".to_string()
    }

    async fn details(&self) -> Option<String> {
        None
    }

    async fn update_status(&self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn health_status(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

pub fn dummy_param() -> TrackedParam {
    TrackedParam::new(Arc::new(DummyParam))
}
