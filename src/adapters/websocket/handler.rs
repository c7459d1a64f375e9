//! WebSocket upgrade handler and broker HTTP surface.
//!
//! Manages the connection lifecycle:
//! 1. Upgrade HTTP → WebSocket
//! 2. Register the connection (outbound channel into the registry)
//! 3. Pump frames both ways until disconnect
//! 4. Unregister on exit
//!
//! Also exposes `GET /health` returning `"OK"` for process supervisors.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::{
    messages::OutboundFrame,
    registry::ConnectionRegistry,
    router::BroadcastRouter,
};

/// Shared state for the broker's HTTP/WS routes.
#[derive(Clone)]
pub struct BrokerState {
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<BroadcastRouter>,
}

impl BrokerState {
    /// Wires a registry and router together.
    pub fn new(registry: Arc<ConnectionRegistry>, router: Arc<BroadcastRouter>) -> Self {
        Self { registry, router }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<BrokerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, state: BrokerState) {
    let (mut sender, mut receiver) = socket.split();

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<OutboundFrame>();
    let connection_id = state.registry.register(frame_tx).await;
    tracing::debug!(connection = %connection_id, "Connection registered");

    // Outbound: drain the registry-fed channel onto the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let message = match frame {
                OutboundFrame::Event(json) => Message::Text(json),
                OutboundFrame::Ping => Message::Ping(Vec::new()),
                OutboundFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            if let Err(e) = sender.send(message).await {
                tracing::debug!(
                    connection = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Inbound: dispatch frames to the router, pongs to the registry.
    let router = state.router.clone();
    let registry = state.registry.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    router.on_message(connection_id, &text).await;
                }
                Ok(Message::Pong(_)) => {
                    registry.mark_alive(&connection_id).await;
                }
                Ok(Message::Ping(_)) => {
                    // Protocol-level ping; the transport answers it.
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection = %connection_id,
                        "Received unsupported binary frame"
                    );
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection = %connection_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection = %connection_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    state.registry.unregister(&connection_id).await;
    tracing::debug!(connection = %connection_id, "Connection unregistered");
}

/// Liveness probe for process supervisors. No payload, no auth.
async fn health_handler() -> &'static str {
    "OK"
}

/// Axum router for the broker endpoints.
pub fn broker_router() -> axum::Router<BrokerState> {
    axum::Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
}
