//! WebSocket broker: connection registry, broadcast router, heartbeat.
//!
//! The broker is best-effort/at-most-once by design. It never persists
//! events; clients reconcile against the durable order store, which stays
//! the system of record.

pub mod handler;
pub mod heartbeat;
pub mod messages;
pub mod registry;
pub mod router;

pub use handler::{broker_router, BrokerState};
pub use heartbeat::{HeartbeatMonitor, DEFAULT_HEARTBEAT_INTERVAL};
pub use messages::{parse_frame, InboundFrame, OutboundFrame, WireEvent};
pub use registry::{ConnectionEntry, ConnectionRegistry, FrameSender};
pub use router::BroadcastRouter;
