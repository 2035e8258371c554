//! keepalive - a lightweight liveness monitor
//!
//! Periodically probes a set of HTTP endpoints taken from the environment
//! and serves their latest state:
//! - Concurrent probes with a per-request timeout
//! - Non-overlapping poll cycles
//! - JSON status and Prometheus metrics over HTTP

pub mod api;
pub mod config;
pub mod metrics;
pub mod monitor;
pub mod state;
pub mod util;

pub use config::Config;
pub use state::AppState;
