//! Healthwatch monitor service.
//!
//! Wires the core engine and notification delivery into a running service:
//!
//! - [`orchestrator`]: parameter registry and polling-cycle orchestration.
//! - [`scheduler`]: the periodic polling loop.
//! - [`routes`]: the HTTP query surface.
//! - [`params`]: built-in health parameters.
//! - [`config`]: environment-based service settings.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod routes;
pub mod scheduler;

pub use error::{MonitorError, MonitorResult};
pub use orchestrator::{HealthOrchestrator, TrialError};
