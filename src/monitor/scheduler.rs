//! Fixed-interval trigger for poll cycles.

use crate::monitor::{PollCoordinator, Prober};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Triggers a cycle immediately and then once per interval.
pub struct Scheduler<P> {
    coordinator: Arc<PollCoordinator<P>>,
    interval: Duration,
}

impl<P: Prober> Scheduler<P> {
    pub fn new(coordinator: Arc<PollCoordinator<P>>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// Run until shutdown is signalled.
    ///
    /// Each trigger runs its cycle on a separate task, so a slow cycle never
    /// holds up the timer; overlapping triggers are skipped by the cycle
    /// guard. A cycle in flight at shutdown is awaited before `run` returns.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval = %humantime::format_duration(self.interval),
            targets = self.coordinator.targets().len(),
            "scheduler starting"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let coordinator = Arc::clone(&self.coordinator);
                    cycles.spawn(async move { coordinator.run_cycle().await });
                }

                Some(_) = cycles.join_next(), if !cycles.is_empty() => {}

                _ = shutdown.recv() => {
                    info!(in_flight = cycles.len(), "scheduler shutting down");
                    break;
                }
            }
        }

        while cycles.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use crate::monitor::{CycleGuard, ProbeOutcome, StatusState, Target};
    use crate::util::ShutdownSignal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct GatedProber {
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Notify>>,
    }

    impl Prober for GatedProber {
        async fn probe(&self, _target: &Target) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            ProbeOutcome::up(200, 1)
        }
    }

    fn scheduler(gate: Option<Arc<Notify>>) -> (Scheduler<GatedProber>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = GatedProber {
            calls: Arc::clone(&calls),
            gate,
        };
        let coordinator = PollCoordinator::new(
            vec![Target::new("api_endpoint_a", "http://a.test")].into(),
            prober,
            Arc::new(StatusState::new()),
            Arc::new(CycleGuard::new()),
            MetricsCollector::new(),
        );
        (
            Scheduler::new(Arc::new(coordinator), Duration::from_secs(60)),
            calls,
        )
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_startup_and_each_interval() {
        let (scheduler, calls) = scheduler(None);
        let signal = ShutdownSignal::new();
        let handle = tokio::spawn(scheduler.run(signal.subscribe()));

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        signal.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_trigger_is_skipped() {
        let gate = Arc::new(Notify::new());
        let (scheduler, calls) = scheduler(Some(Arc::clone(&gate)));
        let coordinator = Arc::clone(&scheduler.coordinator);
        let signal = ShutdownSignal::new();
        let handle = tokio::spawn(scheduler.run(signal.subscribe()));

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second tick lands while the first cycle is still waiting.
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(coordinator.is_running());

        gate.notify_one();
        settle().await;
        assert!(!coordinator.is_running());

        signal.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_cycle() {
        let gate = Arc::new(Notify::new());
        let (scheduler, calls) = scheduler(Some(Arc::clone(&gate)));
        let coordinator = Arc::clone(&scheduler.coordinator);
        let signal = ShutdownSignal::new();
        let handle = tokio::spawn(scheduler.run(signal.subscribe()));

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        signal.shutdown();
        settle().await;
        assert!(!handle.is_finished());
        assert!(coordinator.is_running());

        gate.notify_one();
        handle.await.unwrap();
        assert!(!coordinator.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
