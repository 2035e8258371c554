//! Shared application state.

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::monitor::{CycleGuard, StatusState, Target};
use crate::util::ShutdownSignal;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared state handed to the poll coordinator and the API server.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration.
    config: Arc<Config>,

    /// Targets derived at startup; fixed for the life of the process.
    targets: Arc<[Target]>,

    /// Latest outcome per target.
    status: Arc<StatusState>,

    /// Process-wide "cycle in progress" flag, shared by every coordinator.
    cycle_guard: Arc<CycleGuard>,

    /// Metrics collector.
    metrics: MetricsCollector,

    /// Shutdown signal.
    shutdown: ShutdownSignal,

    /// When the service started.
    started_at: Instant,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: Config, targets: Vec<Target>) -> Self {
        Self {
            config: Arc::new(config),
            targets: targets.into(),
            status: Arc::new(StatusState::new()),
            cycle_guard: Arc::new(CycleGuard::new()),
            metrics: MetricsCollector::new(),
            shutdown: ShutdownSignal::new(),
            started_at: Instant::now(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the monitored targets.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Get the status state.
    pub fn status(&self) -> &Arc<StatusState> {
        &self.status
    }

    /// Get the cycle guard.
    pub fn cycle_guard(&self) -> &Arc<CycleGuard> {
        &self.cycle_guard
    }

    /// Get the metrics collector.
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Get the shutdown signal.
    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Trigger shutdown.
    pub fn trigger_shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
