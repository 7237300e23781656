//! # ntask Telemetry
//!
//! Crate for log routing and registry metrics.

pub mod logging;
pub mod metrics;

pub use logging::{EventLogger, LogDevice, LogRouter};
pub use metrics::MetricsRecorder;
