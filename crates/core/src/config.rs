//! Monitor configuration and its validation.
//!
//! Every duration in the configuration surface is expressed in **seconds**.
//! [`MonitorConfig::validate`] is the single place that enforces the unit
//! contract; callers convert to [`Duration`] through the accessor methods.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MINUTE_SECS: u64 = 60;
pub const HOUR_SECS: u64 = 60 * MINUTE_SECS;
pub const DAY_SECS: u64 = 24 * HOUR_SECS;

/// Default history retention: one day plus one hour, so a day-long repeat
/// window still sees the entry that was originally notified.
pub const DEFAULT_HISTORY_RETENTION_SECS: u64 = DAY_SECS + HOUR_SECS;

/// Default window for the "unknown for a while" check.
pub const DEFAULT_UNKNOWN_WINDOW_SECS: u64 = 15 * MINUTE_SECS;

/// Default window for the "unstable for a while" check.
pub const DEFAULT_UNSTABLE_WINDOW_SECS: u64 = 15 * MINUTE_SECS;

/// Default repeat window for the "still unhealthy" check.
pub const DEFAULT_STILL_UNHEALTHY_WINDOW_SECS: u64 = DAY_SECS;

/// Largest number of seconds whose millisecond value fits in an `i64`.
const MAX_DURATION_SECS: u64 = (i64::MAX / 1000) as u64;

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Recognised configuration options of the notification engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Entries older than this are dropped by history cleanup.
    pub history_retention_threshold_secs: u64,
    pub unknown_window_secs: u64,
    pub unstable_window_secs: u64,
    pub still_unhealthy_window_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_retention_threshold_secs: DEFAULT_HISTORY_RETENTION_SECS,
            unknown_window_secs: DEFAULT_UNKNOWN_WINDOW_SECS,
            unstable_window_secs: DEFAULT_UNSTABLE_WINDOW_SECS,
            still_unhealthy_window_secs: DEFAULT_STILL_UNHEALTHY_WINDOW_SECS,
        }
    }
}

impl MonitorConfig {
    /// Validate the configuration.
    ///
    /// Rules:
    /// - Every value must fit in `i64` milliseconds.
    /// - Check windows must be non-zero.
    /// - A retention of zero is accepted; cleanup still keeps each
    ///   parameter's most recent entry.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_secs(
            self.history_retention_threshold_secs,
            "history_retention_threshold_secs",
        )?;
        validate_window(self.unknown_window_secs, "unknown_window_secs")?;
        validate_window(self.unstable_window_secs, "unstable_window_secs")?;
        validate_window(self.still_unhealthy_window_secs, "still_unhealthy_window_secs")?;

        if self.history_retention_threshold_secs < self.still_unhealthy_window_secs {
            tracing::warn!(
                retention_secs = self.history_retention_threshold_secs,
                window_secs = self.still_unhealthy_window_secs,
                "History retention is shorter than the still-unhealthy window; \
                 repeat notifications may never fire"
            );
        }

        Ok(())
    }

    pub fn history_retention(&self) -> Duration {
        Duration::from_secs(self.history_retention_threshold_secs)
    }

    pub fn unknown_window(&self) -> Duration {
        Duration::from_secs(self.unknown_window_secs)
    }

    pub fn unstable_window(&self) -> Duration {
        Duration::from_secs(self.unstable_window_secs)
    }

    pub fn still_unhealthy_window(&self) -> Duration {
        Duration::from_secs(self.still_unhealthy_window_secs)
    }
}

fn validate_secs(value: u64, name: &str) -> Result<(), CoreError> {
    if value > MAX_DURATION_SECS {
        return Err(CoreError::Validation(format!(
            "{name} must not exceed {MAX_DURATION_SECS} seconds, got {value}"
        )));
    }
    Ok(())
}

fn validate_window(value: u64, name: &str) -> Result<(), CoreError> {
    if value == 0 {
        return Err(CoreError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }
    validate_secs(value, name)
}

/// Milliseconds of `duration`, saturating at `i64::MAX`.
pub fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
