//! Heartbeat monitor: mark-then-verify liveness sweeps.
//!
//! Every interval (default 30 s) the monitor first evicts connections
//! that failed to answer the previous probe, then clears every remaining
//! liveness flag and pings again. A connection therefore survives only if
//! it proves responsiveness within one full interval; a dead socket is
//! gone within two intervals at worst.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::registry::ConnectionRegistry;

/// Default probe interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic liveness sweeper over a [`ConnectionRegistry`].
pub struct HeartbeatMonitor {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl HeartbeatMonitor {
    /// Creates a monitor with the given probe interval.
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Creates a monitor with the default 30 second interval.
    pub fn with_default_interval(registry: Arc<ConnectionRegistry>) -> Self {
        Self::new(registry, DEFAULT_HEARTBEAT_INTERVAL)
    }

    /// Runs sweeps until the shutdown signal flips to `true`.
    ///
    /// Spawn this on the runtime next to the accept loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so connections get a
        // full interval before their first probe.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Heartbeat monitor shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One eviction-then-probe cycle.
    ///
    /// Exposed for tests so eviction timing can be driven without waiting
    /// on wall-clock intervals.
    pub async fn sweep(&self) {
        let evicted = self.registry.evict_stale().await;
        if !evicted.is_empty() {
            tracing::info!(
                count = evicted.len(),
                "Evicted unresponsive connections"
            );
            for id in &evicted {
                tracing::debug!(connection = %id, "Heartbeat eviction");
            }
        }

        let probed = self.registry.probe_all().await;
        tracing::trace!(probed, "Heartbeat probes sent");
    }
}
