//! Fires when status updates have kept failing for longer than a window.

use std::time::Duration;

use crate::types::{HistoryEntry, HistoryResult};

use super::{unnotified_window_exceeds, window_start};

pub(super) fn check(history: &[HistoryEntry], window: Duration) -> bool {
    let entries: Vec<&HistoryEntry> = history.iter().collect();
    match window_start(&entries, HistoryResult::Unknown) {
        Some(start) => unnotified_window_exceeds(&entries, start, window),
        None => false,
    }
}
