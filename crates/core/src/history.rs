//! In-memory history of parameter health results.
//!
//! [`HistoryStore`] keeps one chronological log of [`HistoryEntry`] values
//! per parameter id. Logs are append-only; the only mutation allowed on an
//! existing entry is tagging the most recent one (see [`HistoryStore::tag`]).

use std::collections::HashMap;
use std::time::Duration;

use crate::config::duration_millis;
use crate::types::{now_millis, HistoryEntry, Tag};

/// Observer invoked after every append with the parameter id and its
/// updated history. Observers must not mutate history.
pub type UpdateHandler = Box<dyn Fn(&str, &[HistoryEntry]) + Send + Sync>;

/// Per-parameter result log with bounded retention.
pub struct HistoryStore {
    history: HashMap<String, Vec<HistoryEntry>>,
    retention: Duration,
    update_handlers: Vec<UpdateHandler>,
}

impl HistoryStore {
    /// Create an empty store that retains entries for `retention`.
    pub fn new(retention: Duration) -> Self {
        Self {
            history: HashMap::new(),
            retention,
            update_handlers: Vec::new(),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Register an additional update observer.
    ///
    /// Observers compose: every registered observer runs for every append,
    /// in registration order.
    pub fn on_update<F>(&mut self, handler: F)
    where
        F: Fn(&str, &[HistoryEntry]) + Send + Sync + 'static,
    {
        self.update_handlers.push(Box::new(handler));
    }

    /// Append `entry` to the history of `param_id`, creating it if absent.
    ///
    /// Update observers run after the push. Returns the updated history.
    pub fn append(&mut self, param_id: &str, entry: HistoryEntry) -> &[HistoryEntry] {
        let log = self.history.entry(param_id.to_string()).or_default();
        log.push(entry);

        for handler in &self.update_handlers {
            handler(param_id, log.as_slice());
        }

        log
    }

    /// Set `tag` on the most recent entry of `param_id`.
    ///
    /// No-op when the parameter has no history. Does not notify observers.
    pub fn tag(&mut self, param_id: &str, tag: Tag) {
        if let Some(last) = self.history.get_mut(param_id).and_then(|log| log.last_mut()) {
            last.tag = Some(tag);
        }
    }

    /// Drop entries older than the retention threshold, measured from now.
    pub fn cleanup(&mut self) {
        self.cleanup_at(now_millis());
    }

    /// Drop entries older than the retention threshold, measured from `now_ms`.
    ///
    /// The most recent entry of every parameter is always kept so that the
    /// last known state stays queryable.
    pub fn cleanup_at(&mut self, now_ms: i64) {
        let cutoff = now_ms.saturating_sub(duration_millis(self.retention));
        let mut removed = 0usize;

        for log in self.history.values_mut() {
            let Some(last_index) = log.len().checked_sub(1) else {
                continue;
            };
            let before = log.len();
            let mut index = 0;
            log.retain(|entry| {
                let keep = index == last_index || entry.timestamp > cutoff;
                index += 1;
                keep
            });
            removed += before - log.len();
        }

        if removed > 0 {
            tracing::debug!(removed, "History cleanup: purged old entries");
        }
    }

    /// Read-only view of the whole store.
    pub fn history(&self) -> &HashMap<String, Vec<HistoryEntry>> {
        &self.history
    }

    /// Read-only history of a single parameter; empty when never seen.
    pub fn param_history(&self, param_id: &str) -> &[HistoryEntry] {
        self.history.get(param_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_HISTORY_RETENTION_SECS))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
