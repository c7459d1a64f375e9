//! Order entity and its value objects.
//!
//! Orders are owned by the durable store; the broker only ever sees
//! serialized copies in flight and clients hold read-only cached copies.

mod status;

pub use status::OrderStatus;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, OrderId, OrganizationId, Timestamp};

/// A single line item on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_tag_ids: Option<Vec<String>>,
}

/// Post-completion customer feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub rating: u8,
    pub comment: String,
    pub timestamp: Timestamp,
}

/// Durable order record.
///
/// Field names serialize in the camelCase wire form shared with the
/// browser clients, so the same struct travels over the websocket and in
/// and out of the store adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub organization_id: OrganizationId,
    pub table_number: u32,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub status_message: String,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl Order {
    /// Re-normalizes the id in place.
    ///
    /// Applied at every ingest boundary (store read, event payload) so that
    /// cached copies always compare under the canonical form.
    pub fn normalize_id(&mut self) {
        self.id = OrderId::normalize(self.id.as_str());
    }

    /// Applies a status change, stamping `last_updated`.
    pub fn apply_status(&mut self, status: OrderStatus, status_message: impl Into<String>) {
        self.status = status;
        self.status_message = status_message.into();
        self.last_updated = Timestamp::now();
    }
}
