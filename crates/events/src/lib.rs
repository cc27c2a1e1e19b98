//! Healthwatch notification dispatch and delivery.
//!
//! - [`NotificationSink`]: the outward boundary every notification goes
//!   through.
//! - [`NotificationDispatcher`]: evaluates registered checks against a
//!   parameter's history, sends eligible notifications and tags history.
//! - [`delivery`]: concrete sinks (webhook, log).

pub mod delivery;
pub mod dispatcher;
pub mod sink;

pub use delivery::log::LogSink;
pub use delivery::webhook::{WebhookError, WebhookSink};
pub use dispatcher::{
    DispatchError, NotificationDispatcher, NotificationFailure, ParamLookup, SharedHistory,
};
pub use sink::{NotificationSink, NotifyError};
