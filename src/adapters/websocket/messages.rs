//! Wire protocol between the broker and its clients.
//!
//! Every frame is a single JSON object discriminated by a `type` field:
//! - `subscribe` — a client declares which organization it cares about
//! - `newOrder` — a full order record, broadcast after checkout persists
//! - `statusUpdate` — an order's status changed on an admin dashboard
//!
//! Frames with a `type` this broker does not recognize are passed through
//! verbatim (with a logged warning) so newer clients can talk past an older
//! broker. Frames that are not JSON objects, or that lack `type`, are
//! dropped.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrderId, OrganizationId};
use crate::domain::order::Order;

/// All recognized broadcastable event kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireEvent {
    /// Client → broker: scope delivery to one organization.
    #[serde(rename = "subscribe", rename_all = "camelCase")]
    Subscribe { org_id: OrganizationId },

    /// A newly created order.
    #[serde(rename = "newOrder")]
    NewOrder { order: Order },

    /// An existing order changed status.
    #[serde(rename = "statusUpdate", rename_all = "camelCase")]
    StatusUpdate {
        /// Raw order id as the sender spelled it; consumers must normalize.
        order_id: String,
        status: String,
        #[serde(default)]
        status_message: String,
        org_id: OrganizationId,
        sender_id: String,
    },
}

impl WireEvent {
    /// Organization the event is scoped to, if it carries one.
    ///
    /// Used by the router to honor advisory subscription filters.
    pub fn organization_id(&self) -> Option<&OrganizationId> {
        match self {
            WireEvent::Subscribe { org_id } => Some(org_id),
            WireEvent::NewOrder { order } => Some(&order.organization_id),
            WireEvent::StatusUpdate { org_id, .. } => Some(org_id),
        }
    }

    /// Canonicalizes every order id the event carries.
    ///
    /// Applied once at broker ingest so all downstream consumers see the
    /// `ORD-<digits>` form regardless of which code path produced the id.
    pub fn normalize_ids(&mut self) {
        match self {
            WireEvent::Subscribe { .. } => {}
            WireEvent::NewOrder { order } => order.normalize_id(),
            WireEvent::StatusUpdate { order_id, .. } => {
                *order_id = OrderId::normalize(order_id).as_str().to_string();
            }
        }
    }
}

/// Result of parsing one raw inbound frame.
#[derive(Debug)]
pub enum InboundFrame {
    /// A recognized event.
    Event(WireEvent),

    /// Valid JSON object with an unrecognized `type`; relayed verbatim.
    Passthrough { type_name: String, raw: String },

    /// Not relayable: non-JSON, not an object, missing/non-string `type`,
    /// or a recognized `type` with a payload that does not deserialize.
    Malformed { reason: String },
}

/// Parses a raw text frame into an [`InboundFrame`].
///
/// Never fails; malformed input degrades to [`InboundFrame::Malformed`]
/// so one bad client cannot disturb the broker.
pub fn parse_frame(raw: &str) -> InboundFrame {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return InboundFrame::Malformed {
                reason: format!("not valid JSON: {}", e),
            }
        }
    };

    let Some(obj) = value.as_object() else {
        return InboundFrame::Malformed {
            reason: "frame is not a JSON object".to_string(),
        };
    };

    let Some(type_name) = obj.get("type").and_then(|t| t.as_str()) else {
        return InboundFrame::Malformed {
            reason: "missing string 'type' discriminator".to_string(),
        };
    };

    match type_name {
        "subscribe" | "newOrder" | "statusUpdate" => {
            match serde_json::from_value::<WireEvent>(value.clone()) {
                Ok(mut event) => {
                    event.normalize_ids();
                    InboundFrame::Event(event)
                }
                Err(e) => InboundFrame::Malformed {
                    reason: format!("bad '{}' payload: {}", type_name, e),
                },
            }
        }
        other => InboundFrame::Passthrough {
            type_name: other.to_string(),
            raw: raw.to_string(),
        },
    }
}

/// Frames pushed to a connection's outbound channel.
///
/// The per-socket send task translates these into transport frames; the
/// registry and heartbeat monitor never touch the socket directly.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// Serialized event JSON.
    Event(String),

    /// Low-level liveness probe.
    Ping,

    /// Broker-initiated termination (heartbeat eviction, shutdown).
    Close,
}
