//! Reconnection supervisor: keep one client session connected.
//!
//! On any transport loss the supervisor waits a fixed delay (reference
//! 3 s), dials again, resends the `subscribe` frame for its organization,
//! and resumes feeding frames into the reconciliation engine. Retries are
//! unbounded; events emitted while disconnected are lost, which is
//! acceptable because the next authoritative store load covers the gap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use crate::adapters::websocket::{parse_frame, InboundFrame, WireEvent};
use crate::ports::TransportConnector;

use super::reconciliation::ReconciliationEngine;

/// Default wait between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Drives a [`TransportConnector`] on behalf of one client session.
pub struct ReconnectSupervisor {
    connector: Arc<dyn TransportConnector>,
    engine: Arc<Mutex<ReconciliationEngine>>,
    delay: Duration,
}

impl ReconnectSupervisor {
    /// Creates a supervisor with the default 3 second delay.
    pub fn new(
        connector: Arc<dyn TransportConnector>,
        engine: Arc<Mutex<ReconciliationEngine>>,
    ) -> Self {
        Self::with_delay(connector, engine, DEFAULT_RECONNECT_DELAY)
    }

    /// Creates a supervisor with an explicit retry delay.
    pub fn with_delay(
        connector: Arc<dyn TransportConnector>,
        engine: Arc<Mutex<ReconciliationEngine>>,
        delay: Duration,
    ) -> Self {
        Self {
            connector,
            engine,
            delay,
        }
    }

    /// Connects and reconnects until the shutdown signal flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            self.run_one_session(&mut shutdown).await;
            self.engine.lock().await.mark_disconnected();

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// One connect attempt and, if it succeeds, one receive session.
    ///
    /// Returns when the transport closes or the shutdown signal fires.
    async fn run_one_session(&self, shutdown: &mut watch::Receiver<bool>) {
        self.engine.lock().await.mark_connecting();

        let mut transport = match self.connector.connect().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "Broker connect failed, will retry");
                return;
            }
        };

        // Re-subscribe before processing anything; the broker scopes
        // delivery by the organization declared here.
        let org = self.engine.lock().await.role().organization_id().clone();
        let subscribe = WireEvent::Subscribe { org_id: org };
        let frame = match serde_json::to_string(&subscribe) {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize subscribe frame");
                return;
            }
        };
        if let Err(e) = transport.send(frame).await {
            tracing::warn!(error = %e, "Subscribe send failed, will retry");
            return;
        }
        self.engine.lock().await.mark_subscribed();
        tracing::debug!("Session subscribed, receiving events");

        loop {
            tokio::select! {
                frame = transport.recv() => {
                    match frame {
                        Some(Ok(raw)) => self.dispatch(&raw).await,
                        Some(Err(e)) => {
                            tracing::debug!(error = %e, "Transport error, reconnecting");
                            return;
                        }
                        None => {
                            tracing::debug!("Transport closed, reconnecting");
                            return;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    async fn dispatch(&self, raw: &str) {
        match parse_frame(raw) {
            InboundFrame::Event(event) => {
                let outcome = self.engine.lock().await.apply_event(&event);
                tracing::trace!(?outcome, "Applied broker event");
            }
            InboundFrame::Passthrough { type_name, .. } => {
                tracing::debug!(frame_type = %type_name, "Ignoring unrecognized frame");
            }
            InboundFrame::Malformed { reason } => {
                tracing::debug!(%reason, "Ignoring malformed frame");
            }
        }
    }
}
