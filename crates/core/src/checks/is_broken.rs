//! Fires on the transition edge into `Broken`.

use crate::types::{HistoryEntry, HistoryResult};

use super::{previous_result, reject_unknowns};

pub(super) fn check(history: &[HistoryEntry]) -> bool {
    let known = reject_unknowns(history);

    // Only broken, never-notified entries left: a continuous broken state
    // whose original notification was cleaned up. Repeat it.
    if !known.is_empty()
        && known
            .iter()
            .all(|e| e.result == HistoryResult::Broken && !e.is_notified())
    {
        return true;
    }

    let Some(last) = known.last() else {
        return false;
    };

    // healthy -> broken(notified) -> unknown leaves a notified broken tail
    // once unknowns are dropped.
    last.result == HistoryResult::Broken
        && !last.is_notified()
        && previous_result(&known) != Some(HistoryResult::Broken)
}
