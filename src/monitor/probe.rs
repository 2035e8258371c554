//! Probe executor.
//!
//! Issues one bounded GET per target and reduces whatever happens to a
//! [`ProbeOutcome`]. Any HTTP response counts as up; only transport
//! failures count as down.

use crate::monitor::{ProbeOutcome, Target};
use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Performs a single reachability check against a target.
///
/// Implementations must never fail: every failure mode becomes a
/// [`ProbeOutcome::Down`].
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, target: &Target) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Prober backed by a shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Create a prober whose requests are cut off after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keepalive/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();
        let result = self.client.get(&target.url).send().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                info!(service = %target.name, status, latency_ms, "target up");
                ProbeOutcome::up(status, latency_ms)
            }
            Err(e) => {
                let reason = failure_reason(&e);
                warn!(service = %target.name, reason = %reason, error = %e, "target down");
                ProbeOutcome::down(reason)
            }
        }
    }
}

/// Pick the most specific identifier available for a failed request.
fn failure_reason(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "timeout".to_string();
    }

    if err.is_builder() {
        return format!("invalid url: {}", innermost_message(err));
    }

    if let Some(io_err) = find_io_error(err) {
        match io_err.kind() {
            io::ErrorKind::ConnectionRefused => return "connection refused".to_string(),
            io::ErrorKind::ConnectionReset => return "connection reset".to_string(),
            io::ErrorKind::TimedOut => return "timeout".to_string(),
            _ => {}
        }
    }

    let message = innermost_message(err);
    if err.is_connect() && chain(err).any(|e| e.to_string().starts_with("dns error")) {
        return format!("dns error: {}", message);
    }

    message
}

fn chain<'a>(err: &'a (dyn StdError + 'static)) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |e| (*e).source())
}

fn find_io_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a io::Error> {
    chain(err).find_map(|e| e.downcast_ref::<io::Error>())
}

fn innermost_message(err: &(dyn StdError + 'static)) -> String {
    chain(err)
        .last()
        .map(|e| e.to_string())
        .unwrap_or_else(|| err.to_string())
}
