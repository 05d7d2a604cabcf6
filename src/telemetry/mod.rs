//! Telemetry module for logging and metrics.
//!
//! Provides:
//! - Logging configuration and initialization
//! - Metrics collection for the simulation loop

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{Counter, MetricsRegistry};
