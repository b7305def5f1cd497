//! Metric logging.
//!
//! Provides:
//! - `MetricLogger` trait for composable backends
//! - `ConsoleLogger` for lightweight logging through `tracing`
//! - `NoOpLogger` when nothing should be recorded

mod console;
mod logger;

pub use console::ConsoleLogger;
pub use logger::{MetricLogger, NoOpLogger};
