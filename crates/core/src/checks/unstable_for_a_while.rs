//! Fires when a parameter has stayed `Unstable` for longer than a window.

use std::time::Duration;

use crate::types::{HistoryEntry, HistoryResult};

use super::{reject_unknowns, unnotified_window_exceeds, window_start};

pub(super) fn check(history: &[HistoryEntry], window: Duration) -> bool {
    let known = reject_unknowns(history);
    let Some(start) = window_start(&known, HistoryResult::Unstable) else {
        return false;
    };

    // Broken -> Unstable without a stabilization in between: the broken
    // notification already covers this excursion at a higher severity.
    if start > 0 && known[start - 1].result == HistoryResult::Broken {
        return false;
    }

    unnotified_window_exceeds(&known, start, window)
}
