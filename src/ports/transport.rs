//! Client-side transport ports.
//!
//! The Reconnection Supervisor drives these seams instead of a concrete
//! socket type, so the reconnect and reconciliation logic is exercised in
//! tests with scripted in-memory transports.

use async_trait::async_trait;

/// Errors surfaced by a transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not establish a connection.
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// An established connection failed mid-session.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// A frame could not be sent.
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// One established, bidirectional frame transport.
#[async_trait]
pub trait EventTransport: Send {
    /// Sends one serialized frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Receives the next inbound frame.
    ///
    /// Returns `None` when the peer closed the connection cleanly and
    /// `Some(Err(_))` on abnormal loss; both hand control back to the
    /// Reconnection Supervisor.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;
}

/// Factory that dials the broker.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Attempts to establish a fresh connection.
    async fn connect(&self) -> Result<Box<dyn EventTransport>, TransportError>;
}
