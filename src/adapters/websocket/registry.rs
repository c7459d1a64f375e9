//! Connection registry: the broker's only shared mutable state.
//!
//! Tracks every live transport connection together with its liveness flag
//! and advisory organization subscription. The registry owns no sockets;
//! each entry holds the outbound channel feeding that connection's send
//! task, so registry operations never block on I/O.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{ConnectionId, OrganizationId};

use super::messages::OutboundFrame;

/// Sending half of one connection's outbound channel.
pub type FrameSender = mpsc::UnboundedSender<OutboundFrame>;

struct ConnectionState {
    alive: bool,
    subscription: Option<OrganizationId>,
    sender: FrameSender,
}

/// Stable view of one connection taken at snapshot time.
///
/// Fan-out iterates these; the live set may change underneath without
/// invalidating a snapshot already taken.
#[derive(Clone)]
pub struct ConnectionEntry {
    pub id: ConnectionId,
    pub subscription: Option<OrganizationId>,
    pub sender: FrameSender,
}

/// Registry of currently live connections.
///
/// # Thread Safety
///
/// Uses `RwLock` since broadcasts (snapshot reads) vastly outnumber
/// register/unregister writes.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionState>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a connection and marks it live.
    ///
    /// Returns the generated connection id.
    pub async fn register(&self, sender: FrameSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.write().await.insert(
            id,
            ConnectionState {
                alive: true,
                subscription: None,
                sender,
            },
        );
        id
    }

    /// Removes a connection. Idempotent: unknown ids are a no-op.
    pub async fn unregister(&self, id: &ConnectionId) {
        self.connections.write().await.remove(id);
    }

    /// Takes a stable snapshot of all registered connections.
    pub async fn snapshot(&self) -> Vec<ConnectionEntry> {
        self.connections
            .read()
            .await
            .iter()
            .map(|(id, state)| ConnectionEntry {
                id: *id,
                subscription: state.subscription.clone(),
                sender: state.sender.clone(),
            })
            .collect()
    }

    /// Records that a connection proved responsiveness (pong received).
    pub async fn mark_alive(&self, id: &ConnectionId) {
        if let Some(state) = self.connections.write().await.get_mut(id) {
            state.alive = true;
        }
    }

    /// Clears a connection's liveness flag.
    pub async fn mark_stale(&self, id: &ConnectionId) {
        if let Some(state) = self.connections.write().await.get_mut(id) {
            state.alive = false;
        }
    }

    /// Records the organization a connection subscribed to.
    pub async fn set_subscription(&self, id: &ConnectionId, org: OrganizationId) {
        if let Some(state) = self.connections.write().await.get_mut(id) {
            state.subscription = Some(org);
        }
    }

    /// Removes every connection whose liveness flag is still cleared and
    /// asks its send task to close the socket.
    ///
    /// Returns the evicted ids. Called by the heartbeat monitor at the top
    /// of each cycle, before the next round of probes.
    pub async fn evict_stale(&self) -> Vec<ConnectionId> {
        let mut connections = self.connections.write().await;
        let stale: Vec<ConnectionId> = connections
            .iter()
            .filter(|(_, state)| !state.alive)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            if let Some(state) = connections.remove(id) {
                // Send task may already be gone; eviction still succeeds.
                let _ = state.sender.send(OutboundFrame::Close);
            }
        }
        stale
    }

    /// Clears every liveness flag and sends each connection a ping.
    ///
    /// Connections earn their flag back by answering before the next
    /// [`ConnectionRegistry::evict_stale`] sweep.
    pub async fn probe_all(&self) -> usize {
        let mut connections = self.connections.write().await;
        for state in connections.values_mut() {
            state.alive = false;
            let _ = state.sender.send(OutboundFrame::Ping);
        }
        connections.len()
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether an id is currently registered.
    pub async fn is_registered(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    /// Number of connections currently marked stale (for monitoring).
    pub async fn stale_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|s| !s.alive)
            .count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
