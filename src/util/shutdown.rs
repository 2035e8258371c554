//! Shutdown signalling.

use tokio::sync::broadcast;
use tracing::{error, info};

/// Broadcasts a single shutdown notification to every subscriber.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Subscribe to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Trigger shutdown.
    pub fn shutdown(&self) {
        let _ = self.sender.send(());
    }

    /// Wait for Ctrl+C, then trigger shutdown.
    pub async fn shutdown_on_ctrl_c(&self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received shutdown signal"),
            Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
        }
        self.shutdown();
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
