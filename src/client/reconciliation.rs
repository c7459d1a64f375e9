//! Reconciliation engine: merge push events into a store-backed cache.
//!
//! Each client session keeps a local, newest-first order list loaded from
//! the durable store and folds broadcast events into it. Events are
//! hints: they may arrive twice (broadcast includes the source), out of
//! order relative to the client's own store reads, or reference orders
//! outside this client's view. None of that may corrupt the cache, so:
//!
//! - `newOrder` is idempotent, keyed by normalized id;
//! - `statusUpdate` for an unknown id is a counted no-op, never an
//!   automatic refetch (one broadcast to N clients must not trigger N
//!   store reads);
//! - the durable store remains authoritative: `load_initial` /
//!   `load_more` always overwrite event-derived state.

use std::sync::Arc;

use crate::adapters::websocket::WireEvent;
use crate::domain::foundation::{
    CustomerId, OrderId, OrganizationId, StateMachine, Timestamp,
};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{OrderScope, OrderStore, StoreError};

use super::session::SessionPhase;

/// Default initial/“load more” page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Which view of the order collection this client holds.
#[derive(Debug, Clone)]
pub enum ClientRole {
    /// A customer sees only their own orders at one table.
    Customer {
        organization_id: OrganizationId,
        table_number: u32,
        customer_id: CustomerId,
    },

    /// An admin dashboard sees every order for the organization.
    Admin { organization_id: OrganizationId },
}

impl ClientRole {
    /// Organization this role is scoped to.
    pub fn organization_id(&self) -> &OrganizationId {
        match self {
            ClientRole::Customer {
                organization_id, ..
            } => organization_id,
            ClientRole::Admin { organization_id } => organization_id,
        }
    }

    /// Store scope matching this role.
    pub fn scope(&self) -> OrderScope {
        match self {
            ClientRole::Customer {
                organization_id,
                table_number,
                customer_id,
            } => OrderScope::CustomerTable {
                organization_id: organization_id.clone(),
                table_number: *table_number,
                customer_id: customer_id.clone(),
            },
            ClientRole::Admin { organization_id } => {
                OrderScope::Organization(organization_id.clone())
            }
        }
    }

    /// Whether this is an admin dashboard session.
    pub fn is_admin(&self) -> bool {
        matches!(self, ClientRole::Admin { .. })
    }
}

/// What applying one event did to the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// New order prepended to the list. For admin roles the UI layer
    /// should raise its new-order alert on this outcome.
    Inserted,

    /// Order already cached; duplicate delivery ignored.
    Duplicate,

    /// Order exists but falls outside this client's scope.
    OutOfScope,

    /// Status fields merged into a cached order.
    Merged,

    /// Status update for an order not in the cache; counted, dropped.
    UnknownOrder,

    /// Event kind carries nothing for the cache (e.g. `subscribe`) or the
    /// payload was unusable.
    Skipped,
}

/// Per-session reconciliation state.
pub struct ReconciliationEngine {
    role: ClientRole,
    store: Arc<dyn OrderStore>,
    page_size: usize,
    orders: Vec<Order>,
    phase: SessionPhase,
    unmatched_updates: u64,
    exhausted: bool,
}

impl ReconciliationEngine {
    /// Creates an engine with the default page size.
    pub fn new(role: ClientRole, store: Arc<dyn OrderStore>) -> Self {
        Self::with_page_size(role, store, DEFAULT_PAGE_SIZE)
    }

    /// Creates an engine with an explicit page size.
    pub fn with_page_size(role: ClientRole, store: Arc<dyn OrderStore>, page_size: usize) -> Self {
        Self {
            role,
            store,
            page_size,
            orders: Vec::new(),
            phase: SessionPhase::Disconnected,
            unmatched_updates: 0,
            exhausted: false,
        }
    }

    /// This session's role.
    pub fn role(&self) -> &ClientRole {
        &self.role
    }

    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Cached orders, newest first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Status updates that referenced no cached order (observability).
    pub fn unmatched_updates(&self) -> u64 {
        self.unmatched_updates
    }

    /// Whether the store may hold older orders than the cache.
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    // === Phase transitions (driven by the Reconnection Supervisor) ===

    /// Enters `Connecting`.
    pub fn mark_connecting(&mut self) {
        self.advance(SessionPhase::Connecting);
    }

    /// Enters `Subscribed` once the subscribe frame is on the wire.
    pub fn mark_subscribed(&mut self) {
        self.advance(SessionPhase::Subscribed);
    }

    /// Enters `Receiving` on the first inbound frame.
    pub fn mark_receiving(&mut self) {
        self.advance(SessionPhase::Receiving);
    }

    /// Drops to `Disconnected`, valid from every connected phase.
    pub fn mark_disconnected(&mut self) {
        if self.phase != SessionPhase::Disconnected {
            self.phase = SessionPhase::Disconnected;
        }
    }

    fn advance(&mut self, target: SessionPhase) {
        match self.phase.transition_to(target) {
            Ok(next) => self.phase = next,
            Err(e) => {
                // A late frame racing a disconnect can request a stale
                // transition; keep the current phase.
                tracing::debug!(error = %e, "Ignoring stale session phase transition");
            }
        }
    }

    // === Authoritative loads ===

    /// Replaces the cache with the most recent page from the store.
    pub async fn load_initial(&mut self) -> Result<usize, StoreError> {
        let page = self
            .store
            .list(&self.role.scope(), None, self.page_size)
            .await?;
        self.exhausted = page.len() < self.page_size;
        let count = page.len();
        self.orders = page;
        Ok(count)
    }

    /// Fetches the next page using the oldest cached `created_at` as an
    /// exclusive cursor, appending orders not already cached.
    pub async fn load_more(&mut self) -> Result<usize, StoreError> {
        let Some(cursor) = self.orders.last().map(|o| o.created_at) else {
            return self.load_initial().await;
        };

        let page = self
            .store
            .list(&self.role.scope(), Some(cursor), self.page_size)
            .await?;
        self.exhausted = page.len() < self.page_size;

        let mut appended = 0;
        for order in page {
            if !self.contains(&order.id) {
                self.orders.push(order);
                appended += 1;
            }
        }
        Ok(appended)
    }

    // === Event application ===

    /// Folds one broadcast event into the cache.
    pub fn apply_event(&mut self, event: &WireEvent) -> EventOutcome {
        if self.phase == SessionPhase::Subscribed {
            self.mark_receiving();
        }

        match event {
            WireEvent::Subscribe { .. } => EventOutcome::Skipped,
            WireEvent::NewOrder { order } => self.apply_new_order(order),
            WireEvent::StatusUpdate {
                order_id,
                status,
                status_message,
                ..
            } => self.apply_status_update(order_id, status, status_message),
        }
    }

    fn apply_new_order(&mut self, order: &Order) -> EventOutcome {
        let mut order = order.clone();
        order.normalize_id();
        if !order.id.is_valid() {
            tracing::warn!("Dropping newOrder event with digit-less id");
            return EventOutcome::Skipped;
        }
        if self.contains(&order.id) {
            return EventOutcome::Duplicate;
        }
        if !self.role.scope().contains(&order) {
            return EventOutcome::OutOfScope;
        }
        self.orders.insert(0, order);
        EventOutcome::Inserted
    }

    fn apply_status_update(
        &mut self,
        raw_order_id: &str,
        status: &str,
        status_message: &str,
    ) -> EventOutcome {
        let id = OrderId::normalize(raw_order_id);
        let Some(parsed) = OrderStatus::parse(status) else {
            tracing::warn!(order = %id, status, "Dropping statusUpdate with unknown status");
            return EventOutcome::Skipped;
        };

        match self.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                // Merged permissively: the remote write path already
                // validated the transition.
                order.status = parsed;
                order.status_message = status_message.to_string();
                order.last_updated = Timestamp::now();
                EventOutcome::Merged
            }
            None => {
                // The order may belong to another view or predate this
                // session. Count it; never refetch from here.
                self.unmatched_updates += 1;
                EventOutcome::UnknownOrder
            }
        }
    }

    fn contains(&self, id: &OrderId) -> bool {
        self.orders.iter().any(|o| &o.id == id)
    }
}
