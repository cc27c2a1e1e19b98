//! Built-in health parameters shipped with the monitor service.

pub mod log_volume;

pub use log_volume::{LogVolumeLayer, LogVolumeParam};
