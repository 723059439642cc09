#![deny(unused)]
//! Observability for Verdant.
//!
//! This crate provides:
//! - Execution metrics tracking with bounded rolling windows
//! - Prometheus export of execution counters and latencies
//! - Structured logging and distributed tracing setup

pub mod metrics;
pub mod tracing_layer;
pub mod window;

pub use self::metrics::{setup_metrics_recorder, ExecutionMetricsTracker, MetricsSummary};
pub use tracing_layer::configure_tracing;
pub use window::{ExecutionStats, ExecutionWindow, DEFAULT_WINDOW_SIZE};
