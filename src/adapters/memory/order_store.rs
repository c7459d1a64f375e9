//! In-memory OrderStore implementation for testing.
//!
//! Deterministic, lock-based, no I/O. Pagination follows the same
//! contract as the Postgres adapter so reconciliation tests exercise the
//! real cursor semantics.
//!
//! # Panics
//!
//! Methods may panic if internal locks are poisoned. Acceptable for test
//! code; this adapter is not meant for production.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{OrderScope, OrderStore, StoreError};

/// In-memory order store keyed by normalized order id.
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored orders (for test assertions).
    pub fn order_count(&self) -> usize {
        self.orders
            .read()
            .expect("InMemoryOrderStore: lock poisoned")
            .len()
    }

    /// Clears all orders (for test isolation).
    pub fn clear(&self) {
        self.orders
            .write()
            .expect("InMemoryOrderStore: lock poisoned")
            .clear();
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self
            .orders
            .write()
            .expect("InMemoryOrderStore: lock poisoned");
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self
            .orders
            .read()
            .expect("InMemoryOrderStore: lock poisoned");
        Ok(orders.get(id).cloned())
    }

    async fn list(
        &self,
        scope: &OrderScope,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .orders
            .read()
            .expect("InMemoryOrderStore: lock poisoned");
        let mut page: Vec<Order> = orders
            .values()
            .filter(|o| scope.contains(o))
            .filter(|o| match &before {
                Some(cursor) => o.created_at.is_before(cursor),
                None => true,
            })
            .cloned()
            .collect();
        page.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        page.truncate(limit);
        Ok(page)
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        status_message: &str,
    ) -> Result<Order, StoreError> {
        let mut orders = self
            .orders
            .write()
            .expect("InMemoryOrderStore: lock poisoned");
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        order.apply_status(status, status_message);
        Ok(order.clone())
    }
}
