//! Notification checks: temporal predicates over a parameter's history.
//!
//! A [`NotificationCheck`] is a pure description of one predicate (plus its
//! window, where it has one). Evaluating it requires binding it to an
//! explicit [`CheckContext`] (the parameter and the history to inspect),
//! which yields a [`BoundCheck`]:
//!
//! ```ignore
//! let bound = check.bind(CheckContext { param: &param, history: &history });
//! if bound.check() {
//!     let notification = bound.notification().await;
//! }
//! ```
//!
//! Every check treats a window that already contains a `notified` tag as
//! handled, so one continuous excursion produces one notification.

use std::time::Duration;

use crate::config::MonitorConfig;
use crate::param::TrackedParam;
use crate::types::{HistoryEntry, HistoryResult, Notification, Severity};

mod is_broken;
mod is_stabilized;
mod is_still_unhealthy;
mod unknown_for_a_while;
mod unstable_for_a_while;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// ---------------------------------------------------------------------------
// Check ids
// ---------------------------------------------------------------------------

pub const CHECK_IS_BROKEN: &str = "is-broken";
pub const CHECK_IS_STABILIZED: &str = "is-stabilized";
pub const CHECK_HAS_BEEN_UNKNOWN_FOR_A_WHILE: &str = "has-been-unknown-for-a-while";
pub const CHECK_HAS_BEEN_UNSTABLE_FOR_A_WHILE: &str = "has-been-unstable-for-a-while";
pub const CHECK_IS_STILL_UNHEALTHY: &str = "is-still-unhealthy";

// ---------------------------------------------------------------------------
// NotificationCheck
// ---------------------------------------------------------------------------

/// One of the built-in notification predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationCheck {
    /// The parameter has just become broken.
    IsBroken,
    /// A notified unhealthy parameter is healthy again.
    IsStabilized,
    /// Status updates have been failing for longer than `window`.
    HasBeenUnknownForAWhile { window: Duration },
    /// The parameter has been unstable for longer than `window`.
    HasBeenUnstableForAWhile { window: Duration },
    /// A notified unhealthy state is still unresolved after `window`.
    IsStillUnhealthy { window: Duration },
}

impl NotificationCheck {
    /// The five built-in checks, in the order their notifications are sent.
    pub fn defaults(config: &MonitorConfig) -> Vec<Self> {
        vec![
            Self::IsBroken,
            Self::IsStabilized,
            Self::HasBeenUnknownForAWhile {
                window: config.unknown_window(),
            },
            Self::HasBeenUnstableForAWhile {
                window: config.unstable_window(),
            },
            Self::IsStillUnhealthy {
                window: config.still_unhealthy_window(),
            },
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::IsBroken => CHECK_IS_BROKEN,
            Self::IsStabilized => CHECK_IS_STABILIZED,
            Self::HasBeenUnknownForAWhile { .. } => CHECK_HAS_BEEN_UNKNOWN_FOR_A_WHILE,
            Self::HasBeenUnstableForAWhile { .. } => CHECK_HAS_BEEN_UNSTABLE_FOR_A_WHILE,
            Self::IsStillUnhealthy { .. } => CHECK_IS_STILL_UNHEALTHY,
        }
    }

    /// Bind the check to an evaluation context.
    pub fn bind<'a>(&'a self, ctx: CheckContext<'a>) -> BoundCheck<'a> {
        BoundCheck { check: self, ctx }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// What a check is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub param: &'a TrackedParam,
    pub history: &'a [HistoryEntry],
}

/// A check bound to one evaluation context.
#[derive(Debug, Clone, Copy)]
pub struct BoundCheck<'a> {
    check: &'a NotificationCheck,
    ctx: CheckContext<'a>,
}

impl BoundCheck<'_> {
    pub fn id(&self) -> &'static str {
        self.check.id()
    }

    /// Whether a notification is due right now.
    pub fn check(&self) -> bool {
        let history = self.ctx.history;
        match self.check {
            NotificationCheck::IsBroken => is_broken::check(history),
            NotificationCheck::IsStabilized => is_stabilized::check(history),
            NotificationCheck::HasBeenUnknownForAWhile { window } => {
                unknown_for_a_while::check(history, *window)
            }
            NotificationCheck::HasBeenUnstableForAWhile { window } => {
                unstable_for_a_while::check(history, *window)
            }
            NotificationCheck::IsStillUnhealthy { window } => {
                is_still_unhealthy::check(history, *window)
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self.check {
            NotificationCheck::IsBroken => Severity::Error,
            NotificationCheck::IsStabilized => Severity::Success,
            NotificationCheck::HasBeenUnknownForAWhile { .. } => Severity::Error,
            NotificationCheck::HasBeenUnstableForAWhile { .. } => Severity::Warning,
            NotificationCheck::IsStillUnhealthy { .. } => {
                is_still_unhealthy::repeated(self.ctx.history)
                    .map(|n| n.severity)
                    .unwrap_or(Severity::Error)
            }
        }
    }

    pub async fn title(&self) -> String {
        let param = self.ctx.param;
        match self.check {
            NotificationCheck::IsBroken => format!("Broken: {}", param.title().await),
            NotificationCheck::IsStabilized => format!("Now Healthy: {}", param.title().await),
            NotificationCheck::HasBeenUnknownForAWhile { .. } => {
                format!("Unknown For A While: {}", param.title().await)
            }
            NotificationCheck::HasBeenUnstableForAWhile { .. } => {
                format!("Unstable For A While: {}", param.title().await)
            }
            NotificationCheck::IsStillUnhealthy { .. } => {
                match is_still_unhealthy::repeated(self.ctx.history) {
                    Some(n) => n.title,
                    None => param.title().await,
                }
            }
        }
    }

    pub async fn description(&self) -> String {
        let param = self.ctx.param;
        match self.check {
            NotificationCheck::IsBroken => param
                .details()
                .await
                .unwrap_or_else(|| "The reason for the broken state is unknown".to_string()),
            NotificationCheck::IsStabilized => "Returned to healthy state".to_string(),
            NotificationCheck::HasBeenUnknownForAWhile { .. } => param
                .last_trial_error_message()
                .await
                .unwrap_or_else(|| {
                    "There are no details for the reason of the unknown state".to_string()
                }),
            NotificationCheck::HasBeenUnstableForAWhile { .. } => param
                .details()
                .await
                .unwrap_or_else(|| "The reason for the unstable state is unknown".to_string()),
            NotificationCheck::IsStillUnhealthy { .. } => {
                match is_still_unhealthy::repeated(self.ctx.history) {
                    Some(n) => n.description,
                    None => param.description().await,
                }
            }
        }
    }

    /// The full `(severity, title, description)` triple to send.
    pub async fn notification(&self) -> Notification {
        Notification {
            severity: self.severity(),
            title: self.title().await,
            description: self.description().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared history helpers
// ---------------------------------------------------------------------------

/// History with all unknown entries filtered out.
fn reject_unknowns(history: &[HistoryEntry]) -> Vec<&HistoryEntry> {
    history.iter().filter(|e| !e.result.is_unknown()).collect()
}

/// Result of the entry just before the last one, if any.
fn previous_result(entries: &[&HistoryEntry]) -> Option<HistoryResult> {
    entries.iter().rev().nth(1).map(|e| e.result)
}

/// Index of the first entry of the trailing run of `result` entries.
///
/// `None` when the last entry does not have `result`.
fn window_start(entries: &[&HistoryEntry], result: HistoryResult) -> Option<usize> {
    let run = entries
        .iter()
        .rev()
        .take_while(|e| e.result == result)
        .count();
    (run > 0).then(|| entries.len() - run)
}

/// Whether the trailing run of `result` entries lasted longer than `window`
/// without being notified.
fn unnotified_window_exceeds(
    entries: &[&HistoryEntry],
    start: usize,
    window: Duration,
) -> bool {
    let window_entries = &entries[start..];
    if window_entries.iter().any(|e| e.is_notified()) {
        return false;
    }
    let (Some(first), Some(last)) = (window_entries.first(), window_entries.last()) else {
        return false;
    };
    last.timestamp - first.timestamp > crate::config::duration_millis(window)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
