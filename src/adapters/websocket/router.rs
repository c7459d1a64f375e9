//! Broadcast router: parse inbound frames and fan them out.
//!
//! The router is deliberately forgiving: a malformed frame is logged and
//! dropped without closing the offending connection, and a failed delivery
//! to one connection never aborts delivery to the rest. Delivery includes
//! the source connection; client-side reconciliation deduplicates by
//! normalized order id, so self-delivery is harmless and keeps this path
//! branch-free.

use std::sync::Arc;

use crate::domain::foundation::{ConnectionId, OrganizationId};

use super::messages::{parse_frame, InboundFrame, OutboundFrame, WireEvent};
use super::registry::ConnectionRegistry;

/// Accepts raw inbound messages and redistributes recognized events.
pub struct BroadcastRouter {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastRouter {
    /// Creates a router over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this router fans out through.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handles one raw text frame from a connection.
    ///
    /// Returns the number of connections the frame was delivered to
    /// (zero for subscribe and dropped frames).
    pub async fn on_message(&self, source: ConnectionId, raw: &str) -> usize {
        match parse_frame(raw) {
            InboundFrame::Event(WireEvent::Subscribe { org_id }) => {
                tracing::debug!(connection = %source, org = %org_id, "Connection subscribed");
                self.registry.set_subscription(&source, org_id).await;
                0
            }
            InboundFrame::Event(event) => self.broadcast(&event).await,
            InboundFrame::Passthrough { type_name, raw } => {
                tracing::warn!(
                    connection = %source,
                    frame_type = %type_name,
                    "Relaying frame with unrecognized type verbatim"
                );
                self.fan_out(&raw, None).await
            }
            InboundFrame::Malformed { reason } => {
                tracing::warn!(connection = %source, %reason, "Dropping malformed frame");
                0
            }
        }
    }

    /// Broadcasts a recognized event to all live connections.
    ///
    /// Also the entry point for server-originated events (the order write
    /// path announces persisted changes through here). Event ids must
    /// already be normalized; [`parse_frame`] guarantees that for inbound
    /// frames.
    pub async fn broadcast(&self, event: &WireEvent) -> usize {
        let serialized = match serde_json::to_string(event) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize event, dropping broadcast");
                return 0;
            }
        };
        self.fan_out(&serialized, event.organization_id()).await
    }

    /// Delivers one serialized frame to every connection in the current
    /// snapshot, skipping connections whose subscription names a different
    /// organization. Connections that never subscribed receive everything.
    async fn fan_out(&self, serialized: &str, event_org: Option<&OrganizationId>) -> usize {
        let snapshot = self.registry.snapshot().await;
        let mut delivered = 0;

        for entry in snapshot {
            if let (Some(event_org), Some(subscribed)) = (event_org, &entry.subscription) {
                if subscribed != event_org {
                    continue;
                }
            }
            match entry
                .sender
                .send(OutboundFrame::Event(serialized.to_string()))
            {
                Ok(()) => delivered += 1,
                Err(_) => {
                    // Send task already exited; the heartbeat sweep will
                    // reap the registry entry.
                    tracing::debug!(
                        connection = %entry.id,
                        "Skipping delivery to closed connection"
                    );
                }
            }
        }

        delivered
    }
}
