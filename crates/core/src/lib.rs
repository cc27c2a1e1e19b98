//! Healthwatch core domain.
//!
//! Pure, in-memory building blocks for turning periodic parameter health
//! samples into deduplicated notifications:
//!
//! - [`types`]: health statuses, history entries, tags, notifications.
//! - [`history`]: [`HistoryStore`], the per-parameter result log.
//! - [`checks`]: the built-in [`NotificationCheck`] predicates.
//! - [`param`]: the [`HealthParam`] collaborator trait and its
//!   bookkeeping wrapper [`TrackedParam`].
//! - [`config`]: validated [`MonitorConfig`].
//!
//! Nothing in this crate performs network I/O; delivery and orchestration
//! live in `healthwatch-events` and `healthwatch-monitor`.

pub mod checks;
pub mod config;
pub mod error;
pub mod history;
pub mod param;
pub mod types;

pub use checks::{BoundCheck, CheckContext, NotificationCheck};
pub use config::MonitorConfig;
pub use error::CoreError;
pub use history::HistoryStore;
pub use param::{BoxError, HealthParam, ParamHealthReport, TrackedParam};
pub use types::{HealthStatus, HistoryEntry, HistoryResult, Notification, Severity, Tag};
