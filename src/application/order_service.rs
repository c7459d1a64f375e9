//! Order write path: persist first, then announce.
//!
//! The broadcast event is a cache-invalidation hint, not the system of
//! record, so it is only emitted after the durable write succeeds. A
//! store failure surfaces to the caller (the UI shows a retry affordance)
//! and suppresses the broadcast entirely.

use std::sync::Arc;

use serde_json::json;

use crate::adapters::websocket::{BroadcastRouter, WireEvent};
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, StateMachine};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{ActivityAction, ActivityEntry, ActivityLog, OrderStore, StoreError};

fn store_to_domain(err: StoreError) -> DomainError {
    match err {
        StoreError::NotFound(id) => DomainError::order_not_found(id),
        other => DomainError::new(ErrorCode::DatabaseError, other.to_string()),
    }
}

/// Coordinates the durable store, activity log, and broadcast router.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    activity_log: Arc<dyn ActivityLog>,
    router: Arc<BroadcastRouter>,
}

impl OrderService {
    /// Wires the write path together.
    pub fn new(
        store: Arc<dyn OrderStore>,
        activity_log: Arc<dyn ActivityLog>,
        router: Arc<BroadcastRouter>,
    ) -> Self {
        Self {
            store,
            activity_log,
            router,
        }
    }

    /// Persists a freshly checked-out order and broadcasts `newOrder`.
    pub async fn place_order(&self, mut order: Order) -> Result<Order, DomainError> {
        order.normalize_id();
        if !order.id.is_valid() {
            return Err(DomainError::new(
                ErrorCode::InvalidOrderId,
                "order id contains no digits",
            ));
        }

        self.store.insert(&order).await.map_err(store_to_domain)?;

        self.record_activity(
            &order,
            ActivityAction::OrderCreated,
            json!({
                "orderId": order.id.as_str(),
                "tableNumber": order.table_number,
                "total": order.total,
            }),
            order.customer_id.as_str(),
        )
        .await;

        let delivered = self
            .router
            .broadcast(&WireEvent::NewOrder {
                order: order.clone(),
            })
            .await;
        tracing::info!(
            order = %order.id,
            org = %order.organization_id,
            delivered,
            "Order placed and announced"
        );

        Ok(order)
    }

    /// Applies a status change an admin issued from the dashboard.
    ///
    /// Transitions are validated against the order lifecycle before the
    /// write; an invalid transition fails fast without touching the store.
    pub async fn update_status(
        &self,
        raw_order_id: &str,
        status: OrderStatus,
        status_message: &str,
        sender_id: &str,
    ) -> Result<Order, DomainError> {
        let id = OrderId::normalize(raw_order_id);
        if !id.is_valid() {
            return Err(DomainError::new(
                ErrorCode::InvalidOrderId,
                format!("'{}' contains no digits", raw_order_id),
            ));
        }

        let current = self
            .store
            .find(&id)
            .await
            .map_err(store_to_domain)?
            .ok_or_else(|| DomainError::order_not_found(&id))?;
        current.status.transition_to(status)?;

        let updated = self
            .store
            .update_status(&id, status, status_message)
            .await
            .map_err(store_to_domain)?;

        self.record_activity(
            &updated,
            ActivityAction::StatusUpdate,
            json!({
                "orderId": updated.id.as_str(),
                "from": current.status.as_str(),
                "to": status.as_str(),
                "statusMessage": status_message,
            }),
            sender_id,
        )
        .await;

        let delivered = self
            .router
            .broadcast(&WireEvent::StatusUpdate {
                order_id: updated.id.as_str().to_string(),
                status: status.as_str().to_string(),
                status_message: status_message.to_string(),
                org_id: updated.organization_id.clone(),
                sender_id: sender_id.to_string(),
            })
            .await;
        tracing::info!(
            order = %updated.id,
            status = status.as_str(),
            delivered,
            "Status update announced"
        );

        Ok(updated)
    }

    /// Appends to the activity log, logging instead of failing.
    ///
    /// The order mutation already persisted; losing one audit entry is
    /// preferable to failing the caller or suppressing the broadcast.
    async fn record_activity(
        &self,
        order: &Order,
        action: ActivityAction,
        details: serde_json::Value,
        user_id: &str,
    ) {
        let entry = ActivityEntry::new(
            order.organization_id.clone(),
            action,
            details,
            user_id,
        );
        if let Err(e) = self.activity_log.append(entry).await {
            tracing::warn!(order = %order.id, error = %e, "Failed to append activity entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryActivityLog, InMemoryOrderStore};
    use crate::adapters::websocket::{ConnectionRegistry, OutboundFrame};
    use crate::domain::foundation::{CustomerId, OrganizationId, Timestamp};
    use tokio::sync::mpsc;

    struct Fixture {
        store: Arc<InMemoryOrderStore>,
        log: Arc<InMemoryActivityLog>,
        registry: Arc<ConnectionRegistry>,
        service: OrderService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryOrderStore::new());
        let log = Arc::new(InMemoryActivityLog::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(BroadcastRouter::new(registry.clone()));
        let service = OrderService::new(store.clone(), log.clone(), router);
        Fixture {
            store,
            log,
            registry,
            service,
        }
    }

    fn sample_order(raw_id: &str, org: &str) -> Order {
        let now = Timestamp::now();
        Order {
            id: OrderId::normalize(raw_id),
            organization_id: OrganizationId::new(org),
            table_number: 3,
            customer_id: CustomerId::new("cust-1"),
            items: vec![],
            subtotal: 10.0,
            total: 10.0,
            status: OrderStatus::Pending,
            status_message: String::new(),
            created_at: now,
            last_updated: now,
            feedback: None,
        }
    }

    #[tokio::test]
    async fn place_order_persists_logs_and_broadcasts() {
        let fx = fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        fx.registry.register(tx).await;

        let placed = fx.service.place_order(sample_order("5", "org-a")).await.unwrap();

        assert_eq!(placed.id.as_str(), "ORD-5");
        assert_eq!(fx.store.order_count(), 1);
        assert_eq!(fx.log.entries_of(ActivityAction::OrderCreated).len(), 1);
        match rx.try_recv().unwrap() {
            OutboundFrame::Event(json) => assert!(json.contains(r#""type":"newOrder""#)),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_status_announces_only_after_write() {
        let fx = fixture();
        fx.service.place_order(sample_order("5", "org-a")).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        fx.registry.register(tx).await;

        // Raw, unnormalized id as a dashboard would send it.
        let updated = fx
            .service
            .update_status("5", OrderStatus::Preparing, "on the wok", "admin-1")
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Preparing);
        let persisted = fx
            .store
            .find(&OrderId::normalize("ORD-5"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.status, OrderStatus::Preparing);
        match rx.try_recv().unwrap() {
            OutboundFrame::Event(json) => {
                assert!(json.contains(r#""type":"statusUpdate""#));
                assert!(json.contains(r#""orderId":"ORD-5""#));
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_order_fails_without_broadcast() {
        let fx = fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        fx.registry.register(tx).await;

        let err = fx
            .service
            .update_status("99", OrderStatus::Preparing, "", "admin-1")
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert!(rx.try_recv().is_err());
        assert!(fx.log.entries().is_empty());
    }

    #[tokio::test]
    async fn invalid_transition_fails_without_touching_store() {
        let fx = fixture();
        fx.service.place_order(sample_order("5", "org-a")).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        fx.registry.register(tx).await;

        let err = fx
            .service
            .update_status("5", OrderStatus::Completed, "", "admin-1")
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        let persisted = fx
            .store
            .find(&OrderId::normalize("5"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.status, OrderStatus::Pending);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn order_id_without_digits_is_rejected() {
        let fx = fixture();
        let mut order = sample_order("5", "org-a");
        order.id = OrderId::normalize("garbage");

        let err = fx.service.place_order(order).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderId);
        assert_eq!(fx.store.order_count(), 0);
    }
}
