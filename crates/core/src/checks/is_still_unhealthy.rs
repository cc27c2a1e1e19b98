//! Repeats the last notification while its unhealthy state is unresolved.

use std::time::Duration;

use crate::config::duration_millis;
use crate::types::{HistoryEntry, HistoryResult, Notification};

pub(super) fn check(history: &[HistoryEntry], window: Duration) -> bool {
    let Some(notified_index) = history.iter().rposition(HistoryEntry::is_notified) else {
        return false;
    };
    let Some(recent) = history.last() else {
        return false;
    };

    if history[notified_index..]
        .iter()
        .any(|e| e.result == HistoryResult::Healthy)
    {
        return false;
    }

    recent.timestamp - history[notified_index].timestamp > duration_millis(window)
}

/// The notification stored on the last notified entry.
pub(super) fn repeated(history: &[HistoryEntry]) -> Option<Notification> {
    history
        .iter()
        .rev()
        .find_map(|e| e.tag.as_ref().filter(|t| t.is_notified()))
        .and_then(|tag| tag.notification())
}
