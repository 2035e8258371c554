//! Metrics collector using prometheus-client.
//!
//! Provides metrics for probe results, probe latency, target reachability,
//! and poll cycles.

use crate::monitor::ProbeOutcome;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Labels for per-target metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TargetLabels {
    pub target: String,
}

/// Labels for probe result metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ProbeLabels {
    pub target: String,
    pub result: ProbeResult,
}

/// Result of a probe.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum ProbeResult {
    Up,
    Down,
}

/// Labels for cycle metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CycleLabels {
    pub result: CycleResult,
}

/// How a triggered cycle ended.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum CycleResult {
    Completed,
    Skipped,
}

/// Collects and stores all metrics.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsCollectorInner>,
}

struct MetricsCollectorInner {
    /// Probe results counter.
    probes_total: Family<ProbeLabels, Counter>,
    /// Probe latency histogram (in seconds).
    probe_latency_seconds: Family<TargetLabels, Histogram>,
    /// Target reachability gauge (1 = up, 0 = down).
    target_up: Family<TargetLabels, Gauge>,
    /// Triggered cycles counter.
    cycles_total: Family<CycleLabels, Counter>,
    /// Completed cycle duration histogram (in seconds).
    cycle_duration_seconds: Histogram,
    /// The prometheus registry.
    registry: Registry,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let probes_total = Family::<ProbeLabels, Counter>::default();
        let probe_latency_seconds = Family::<TargetLabels, Histogram>::new_with_constructor(|| {
            // Buckets: 5ms up to roughly 20s
            Histogram::new(exponential_buckets(0.005, 2.0, 13))
        });
        let target_up = Family::<TargetLabels, Gauge>::default();
        let cycles_total = Family::<CycleLabels, Counter>::default();
        let cycle_duration_seconds = Histogram::new(exponential_buckets(0.005, 2.0, 13));

        registry.register(
            "keepalive_probes",
            "Total number of probes performed",
            probes_total.clone(),
        );
        registry.register(
            "keepalive_probe_latency_seconds",
            "Probe latency in seconds",
            probe_latency_seconds.clone(),
        );
        registry.register(
            "keepalive_target_up",
            "Target reachability (1=up, 0=down)",
            target_up.clone(),
        );
        registry.register(
            "keepalive_cycles",
            "Total number of triggered poll cycles",
            cycles_total.clone(),
        );
        registry.register(
            "keepalive_cycle_duration_seconds",
            "Poll cycle duration in seconds",
            cycle_duration_seconds.clone(),
        );

        Self {
            inner: Arc::new(MetricsCollectorInner {
                probes_total,
                probe_latency_seconds,
                target_up,
                cycles_total,
                cycle_duration_seconds,
                registry,
            }),
        }
    }

    /// Get the prometheus registry for encoding.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Record the outcome of one probe.
    pub fn record_probe(&self, target: &str, outcome: &ProbeOutcome) {
        let target_labels = TargetLabels {
            target: target.to_string(),
        };

        let result = match outcome {
            ProbeOutcome::Up { latency_ms, .. } => {
                self.inner
                    .probe_latency_seconds
                    .get_or_create(&target_labels)
                    .observe(Duration::from_millis(*latency_ms).as_secs_f64());
                ProbeResult::Up
            }
            ProbeOutcome::Down { .. } => ProbeResult::Down,
        };

        self.inner
            .target_up
            .get_or_create(&target_labels)
            .set(if outcome.is_up() { 1 } else { 0 });

        let labels = ProbeLabels {
            target: target.to_string(),
            result,
        };
        self.inner.probes_total.get_or_create(&labels).inc();
    }

    /// Record a cycle that ran to completion.
    pub fn record_cycle_completed(&self, duration: Duration) {
        self.inner
            .cycles_total
            .get_or_create(&CycleLabels {
                result: CycleResult::Completed,
            })
            .inc();
        self.inner
            .cycle_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a trigger that found a cycle already in progress.
    pub fn record_cycle_skipped(&self) {
        self.inner
            .cycles_total
            .get_or_create(&CycleLabels {
                result: CycleResult::Skipped,
            })
            .inc();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
