//! Concrete notification sinks.
//!
//! [`webhook::WebhookSink`] pushes notifications to an external HTTP
//! endpoint; [`log::LogSink`] writes them to the process log when no
//! external channel is configured.

pub mod log;
pub mod webhook;
