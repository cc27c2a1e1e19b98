//! Fires when a notified unhealthy parameter returns to `Healthy`.
//!
//! The last `notified` entry is always located on the unfiltered history.
//! Unknown entries are filtered out for the latest/previous comparison,
//! except when the last notification was itself about an unknown state:
//! then an `unknown -> healthy` edge counts as stabilization.

use crate::types::{HistoryEntry, HistoryResult};

use super::{previous_result, reject_unknowns};

pub(super) fn check(history: &[HistoryEntry]) -> bool {
    let last_notified = history.iter().rev().find(|e| e.is_notified());

    let entries: Vec<&HistoryEntry> = match last_notified {
        Some(notified) if notified.result.is_unknown() => history.iter().collect(),
        _ => reject_unknowns(history),
    };

    let is_healthy_edge = entries.last().map(|e| e.result) == Some(HistoryResult::Healthy)
        && previous_result(&entries) != Some(HistoryResult::Healthy);

    is_healthy_edge && last_notified.is_some_and(|e| e.result != HistoryResult::Healthy)
}
