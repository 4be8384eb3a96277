//! Visibility monitors.
//!
//! A monitor binds one host observer to a caller callback and a visibility
//! condition. Each public entry-point call builds its own monitor; monitors
//! share no state.

/// Monitor construction over a host observer.
pub mod factory;
/// Caller-side monitor handle.
pub mod handle;

pub use factory::create_monitor;
pub use handle::{MonitorId, ViewMonitor};
