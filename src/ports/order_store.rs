//! OrderStore port - interface to the authoritative order persistence.
//!
//! The broker never persists anything itself; events are hints and this
//! store is the system of record. Clients reconcile their caches against
//! it, so reads are cursor-paginated to stay correct under concurrent
//! inserts.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, OrderId, OrganizationId, Timestamp};
use crate::domain::order::{Order, OrderStatus};

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("Store error: {0}")]
    Backend(String),

    /// Referenced order does not exist.
    #[error("Order {0} not found")]
    NotFound(OrderId),

    /// Row could not be decoded into a domain order.
    #[error("Corrupt order record: {0}")]
    Corrupt(String),
}

/// Which slice of the order collection a reader is entitled to see.
///
/// Admin dashboards see everything for their organization; a customer
/// session sees only its own orders at one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    Organization(OrganizationId),
    CustomerTable {
        organization_id: OrganizationId,
        table_number: u32,
        customer_id: CustomerId,
    },
}

impl OrderScope {
    /// Organization this scope belongs to.
    pub fn organization_id(&self) -> &OrganizationId {
        match self {
            OrderScope::Organization(org) => org,
            OrderScope::CustomerTable {
                organization_id, ..
            } => organization_id,
        }
    }

    /// Whether an order falls inside this scope.
    pub fn contains(&self, order: &Order) -> bool {
        match self {
            OrderScope::Organization(org) => &order.organization_id == org,
            OrderScope::CustomerTable {
                organization_id,
                table_number,
                customer_id,
            } => {
                &order.organization_id == organization_id
                    && order.table_number == *table_number
                    && &order.customer_id == customer_id
            }
        }
    }
}

/// Port for the durable, authoritative order store.
///
/// Pagination contract: `list` returns at most `limit` orders in this
/// scope ordered by descending `created_at`; when `before` is set only
/// orders with `created_at` strictly less than the cursor are returned.
/// Timestamp cursors (rather than numeric offsets) keep "load more"
/// stable while new orders are being inserted concurrently.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order. The id must already be normalized.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    /// Fetches one order by normalized id.
    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Lists a page of orders for a scope, newest first.
    async fn list(
        &self,
        scope: &OrderScope,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<Order>, StoreError>;

    /// Updates status and status message of an existing order.
    ///
    /// Returns the updated record so callers can broadcast exactly what
    /// was persisted. Fails with [`StoreError::NotFound`] for unknown ids.
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        status_message: &str,
    ) -> Result<Order, StoreError>;
}
