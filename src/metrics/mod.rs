//! Metrics collection.

mod collector;

pub use collector::MetricsCollector;
