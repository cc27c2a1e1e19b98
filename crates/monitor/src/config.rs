use std::str::FromStr;
use std::time::Duration;

use healthwatch_core::config::{
    DEFAULT_HISTORY_RETENTION_SECS, DEFAULT_STILL_UNHEALTHY_WINDOW_SECS,
    DEFAULT_UNKNOWN_WINDOW_SECS, DEFAULT_UNSTABLE_WINDOW_SECS,
};
use healthwatch_core::{CoreError, MonitorConfig};

/// Default seconds between two polling cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default number of error log lines tolerated inside the log window.
pub const DEFAULT_LOG_ERROR_MAX_COUNT: usize = 10;

/// Default sliding window of the error-log parameter.
pub const DEFAULT_LOG_ERROR_WINDOW_SECS: u64 = 3600;

/// Service configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Seconds between polling cycles (default: `60`).
    pub poll_interval_secs: u64,
    /// Notification engine options, validated.
    pub monitor: MonitorConfig,
    /// Webhook receiving notifications; notifications are only logged when unset.
    pub webhook_url: Option<String>,
    pub log_error_max_count: usize,
    pub log_error_window_secs: u64,
}

impl MonitorSettings {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default   |
    /// |-------------------------------|-----------|
    /// | `HOST`                        | `0.0.0.0` |
    /// | `PORT`                        | `3000`    |
    /// | `POLL_INTERVAL_SECS`          | `60`      |
    /// | `HISTORY_RETENTION_SECS`      | `90000`   |
    /// | `UNKNOWN_WINDOW_SECS`         | `900`     |
    /// | `UNSTABLE_WINDOW_SECS`        | `900`     |
    /// | `STILL_UNHEALTHY_WINDOW_SECS` | `86400`   |
    /// | `NOTIFY_WEBHOOK_URL`          | unset     |
    /// | `LOG_ERROR_MAX_COUNT`         | `10`      |
    /// | `LOG_ERROR_WINDOW_SECS`       | `3600`    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;
        let poll_interval_secs = parse_or(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;

        let monitor = MonitorConfig {
            history_retention_threshold_secs: parse_or(
                &lookup,
                "HISTORY_RETENTION_SECS",
                DEFAULT_HISTORY_RETENTION_SECS,
            )?,
            unknown_window_secs: parse_or(&lookup, "UNKNOWN_WINDOW_SECS", DEFAULT_UNKNOWN_WINDOW_SECS)?,
            unstable_window_secs: parse_or(
                &lookup,
                "UNSTABLE_WINDOW_SECS",
                DEFAULT_UNSTABLE_WINDOW_SECS,
            )?,
            still_unhealthy_window_secs: parse_or(
                &lookup,
                "STILL_UNHEALTHY_WINDOW_SECS",
                DEFAULT_STILL_UNHEALTHY_WINDOW_SECS,
            )?,
        };
        monitor.validate()?;

        if poll_interval_secs == 0 {
            return Err(CoreError::Validation(
                "POLL_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        let webhook_url = lookup("NOTIFY_WEBHOOK_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let log_error_max_count =
            parse_or(&lookup, "LOG_ERROR_MAX_COUNT", DEFAULT_LOG_ERROR_MAX_COUNT)?;
        let log_error_window_secs =
            parse_or(&lookup, "LOG_ERROR_WINDOW_SECS", DEFAULT_LOG_ERROR_WINDOW_SECS)?;

        Ok(Self {
            host,
            port,
            poll_interval_secs,
            monitor,
            webhook_url,
            log_error_max_count,
            log_error_window_secs,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn log_error_window(&self) -> Duration {
        Duration::from_secs(self.log_error_window_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} has an invalid value: {raw:?}"))),
        None => Ok(default),
    }
}
