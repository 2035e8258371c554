//! Poll cycle coordinator.
//!
//! One cycle probes every target concurrently and writes each outcome into
//! the status state as it arrives. At most one cycle is in progress at any
//! instant across the process; a trigger that finds one running is dropped,
//! not queued.

use crate::metrics::MetricsCollector;
use crate::monitor::{Prober, StatusState, Target};
use crate::state::AppState;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Process-wide "cycle in progress" flag.
#[derive(Debug, Default)]
pub struct CycleGuard {
    in_progress: AtomicBool,
}

/// Held for the duration of a cycle. Dropping it clears the guard.
#[derive(Debug)]
pub struct CyclePermit<'a> {
    guard: &'a CycleGuard,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a cycle already holds it.
    pub fn try_acquire(&self) -> Option<CyclePermit<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CyclePermit { guard: self })
    }

    pub fn is_held(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

impl Drop for CyclePermit<'_> {
    fn drop(&mut self) {
        self.guard.in_progress.store(false, Ordering::Release);
    }
}

/// What a call to [`PollCoordinator::run_cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Another cycle was in progress; nothing was probed.
    Skipped,
    /// Every probe resolved.
    Completed {
        up: usize,
        down: usize,
        /// Probe tasks that died without producing an outcome.
        failed: usize,
        elapsed: Duration,
    },
}

/// Fans probes out across all targets and owns every write to the status
/// state.
pub struct PollCoordinator<P> {
    targets: Arc<[Target]>,
    prober: Arc<P>,
    status: Arc<StatusState>,
    metrics: MetricsCollector,
    guard: Arc<CycleGuard>,
}

impl<P: Prober> PollCoordinator<P> {
    pub fn new(
        targets: Arc<[Target]>,
        prober: P,
        status: Arc<StatusState>,
        guard: Arc<CycleGuard>,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            targets,
            prober: Arc::new(prober),
            status,
            metrics,
            guard,
        }
    }

    /// Build a coordinator writing into the application's status state.
    ///
    /// Every coordinator built from the same state shares its cycle guard.
    pub fn from_state(state: &AppState, prober: P) -> Self {
        Self::new(
            Arc::from(state.targets()),
            prober,
            Arc::clone(state.status()),
            Arc::clone(state.cycle_guard()),
            state.metrics().clone(),
        )
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Whether a cycle currently holds the guard.
    pub fn is_running(&self) -> bool {
        self.guard.is_held()
    }

    /// Run one sweep over all targets, unless one is already in progress.
    pub async fn run_cycle(&self) -> CycleReport {
        let Some(_permit) = self.guard.try_acquire() else {
            warn!("previous cycle still in progress, skipping");
            self.metrics.record_cycle_skipped();
            return CycleReport::Skipped;
        };

        let id = Uuid::new_v4().simple().to_string();
        let span = info_span!("cycle", id = %&id[..8], targets = self.targets.len());
        self.sweep().instrument(span).await
    }

    async fn sweep(&self) -> CycleReport {
        info!("pinging targets");
        let start = Instant::now();

        let mut pending: FuturesUnordered<_> = self
            .targets
            .iter()
            .map(|target| {
                let prober = Arc::clone(&self.prober);
                let probe_target = target.clone();
                let handle = tokio::spawn(
                    async move { prober.probe(&probe_target).await }.in_current_span(),
                );
                let name = target.name.clone();
                async move { (name, handle.await) }
            })
            .collect();

        let (mut up, mut down, mut failed) = (0, 0, 0);

        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(outcome) => {
                    if outcome.is_up() {
                        up += 1;
                    } else {
                        down += 1;
                    }
                    self.metrics.record_probe(&name, &outcome);
                    self.status.record(&name, outcome);
                }
                Err(e) => {
                    // Previous entry for this target stands.
                    failed += 1;
                    error!(service = %name, error = %e, "probe task failed");
                }
            }
        }

        let elapsed = start.elapsed();
        self.metrics.record_cycle_completed(elapsed);
        info!(
            up,
            down,
            failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "cycle complete"
        );

        CycleReport::Completed {
            up,
            down,
            failed,
            elapsed,
        }
    }
}
