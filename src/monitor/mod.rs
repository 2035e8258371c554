//! Endpoint polling: targets, probes, cycles, and the status they produce.

mod cycle;
mod probe;
mod scheduler;
mod status;
mod target;

pub use cycle::{CycleGuard, CyclePermit, CycleReport, PollCoordinator};
pub use probe::{HttpProber, Prober};
pub use scheduler::Scheduler;
pub use status::{ProbeOutcome, Snapshot, StatusState};
pub use target::{derive_targets, Target};
