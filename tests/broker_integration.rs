//! End-to-end tests for the broadcast broker and reconciliation layer.
//!
//! These tests run the real registry, router, heartbeat monitor, order
//! service, and reconciliation engines against in-memory adapters; the
//! only thing simulated is the socket itself (each "client" drains the
//! outbound channel its registry entry feeds).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};

use ordercast::adapters::memory::{InMemoryActivityLog, InMemoryOrderStore};
use ordercast::adapters::websocket::{
    parse_frame, BroadcastRouter, ConnectionRegistry, HeartbeatMonitor, InboundFrame,
    OutboundFrame, WireEvent,
};
use ordercast::application::OrderService;
use ordercast::client::{ClientRole, EventOutcome, ReconciliationEngine, ReconnectSupervisor};
use ordercast::domain::foundation::{ConnectionId, CustomerId, OrderId, OrganizationId, Timestamp};
use ordercast::domain::order::{Order, OrderItem, OrderStatus};
use ordercast::ports::{ActivityAction, EventTransport, TransportConnector, TransportError};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Broker {
    registry: Arc<ConnectionRegistry>,
    router: Arc<BroadcastRouter>,
    store: Arc<InMemoryOrderStore>,
    log: Arc<InMemoryActivityLog>,
    service: OrderService,
}

fn broker() -> Broker {
    let registry = Arc::new(ConnectionRegistry::new());
    let router = Arc::new(BroadcastRouter::new(registry.clone()));
    let store = Arc::new(InMemoryOrderStore::new());
    let log = Arc::new(InMemoryActivityLog::new());
    let service = OrderService::new(store.clone(), log.clone(), router.clone());
    Broker {
        registry,
        router,
        store,
        log,
        service,
    }
}

/// A connected client: registry entry plus a reconciliation engine that
/// frames are manually pumped into, standing in for the socket tasks.
struct TestClient {
    rx: mpsc::UnboundedReceiver<OutboundFrame>,
    engine: ReconciliationEngine,
}

impl TestClient {
    async fn connect(broker: &Broker, role: ClientRole) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = broker.registry.register(tx).await;
        broker
            .registry
            .set_subscription(&id, role.organization_id().clone())
            .await;
        let engine = ReconciliationEngine::new(role, broker.store.clone());
        Self { rx, engine }
    }

    /// Applies every queued event frame to the engine.
    fn pump(&mut self) -> Vec<EventOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            if let OutboundFrame::Event(raw) = frame {
                if let InboundFrame::Event(event) = parse_frame(&raw) {
                    outcomes.push(self.engine.apply_event(&event));
                }
            }
        }
        outcomes
    }

    fn queued_events(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            if let OutboundFrame::Event(raw) = frame {
                frames.push(raw);
            }
        }
        frames
    }
}

fn order_for_table(raw_id: &str, org: &str, table: u32) -> Order {
    let now = Timestamp::now();
    Order {
        id: OrderId::normalize(raw_id),
        organization_id: OrganizationId::new(org),
        table_number: table,
        customer_id: CustomerId::new("cust-1"),
        items: vec![OrderItem {
            name: "Green Curry".to_string(),
            price: 12.0,
            quantity: 1,
            special_instructions: None,
            selected_tag_ids: None,
        }],
        subtotal: 12.0,
        total: 13.0,
        status: OrderStatus::Pending,
        status_message: String::new(),
        created_at: now,
        last_updated: now,
        feedback: None,
    }
}

// =============================================================================
// Scenario: order lifecycle across org A clients and an org B bystander
// =============================================================================

#[tokio::test]
async fn order_lifecycle_reaches_all_org_clients() {
    let broker = broker();
    let mut admin_a = TestClient::connect(
        &broker,
        ClientRole::Admin {
            organization_id: OrganizationId::new("org-a"),
        },
    )
    .await;
    let mut customer_a = TestClient::connect(
        &broker,
        ClientRole::Customer {
            organization_id: OrganizationId::new("org-a"),
            table_number: 3,
            customer_id: CustomerId::new("cust-1"),
        },
    )
    .await;
    let mut admin_b = TestClient::connect(
        &broker,
        ClientRole::Admin {
            organization_id: OrganizationId::new("org-b"),
        },
    )
    .await;

    // Customer places order id "5" for table 3, org A.
    broker
        .service
        .place_order(order_for_table("5", "org-a", 3))
        .await
        .unwrap();

    assert_eq!(admin_a.pump(), vec![EventOutcome::Inserted]);
    assert_eq!(customer_a.pump(), vec![EventOutcome::Inserted]);
    // Org B's subscription filtered the event out entirely.
    assert!(admin_b.pump().is_empty());

    // Admin moves the order to preparing, sending the raw id "5".
    broker
        .service
        .update_status("5", OrderStatus::Preparing, "firing now", "admin-1")
        .await
        .unwrap();

    assert_eq!(admin_a.pump(), vec![EventOutcome::Merged]);
    assert_eq!(customer_a.pump(), vec![EventOutcome::Merged]);

    for client in [&admin_a, &customer_a] {
        let order = &client.engine.orders()[0];
        assert_eq!(order.id.as_str(), "ORD-5");
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.status_message, "firing now");
    }

    // Audit trail recorded both mutations.
    assert_eq!(broker.log.entries_of(ActivityAction::OrderCreated).len(), 1);
    assert_eq!(broker.log.entries_of(ActivityAction::StatusUpdate).len(), 1);
}

#[tokio::test]
async fn unsubscribed_client_ignores_foreign_org_event() {
    let broker = broker();
    // Connected but never subscribed: receives everything (permissive
    // delivery), and scoping happens client-side.
    let (tx, rx) = mpsc::unbounded_channel();
    broker.registry.register(tx).await;
    let mut bystander = TestClient {
        rx,
        engine: ReconciliationEngine::new(
            ClientRole::Admin {
                organization_id: OrganizationId::new("org-b"),
            },
            broker.store.clone(),
        ),
    };

    broker
        .service
        .place_order(order_for_table("5", "org-a", 3))
        .await
        .unwrap();

    assert_eq!(bystander.pump(), vec![EventOutcome::OutOfScope]);
    assert!(bystander.engine.orders().is_empty());
}

// =============================================================================
// Fan-out and resilience
// =============================================================================

#[tokio::test]
async fn fan_out_delivers_exactly_one_copy_per_connection() {
    let broker = broker();
    let mut receivers = Vec::new();
    for _ in 0..5 {
        let (tx, rx) = mpsc::unbounded_channel();
        broker.registry.register(tx).await;
        receivers.push(rx);
    }
    let (source_tx, source_rx) = mpsc::unbounded_channel();
    let source = broker.registry.register(source_tx).await;
    receivers.push(source_rx);

    let raw = serde_json::to_string(&WireEvent::NewOrder {
        order: order_for_table("7", "org-a", 2),
    })
    .unwrap();
    let delivered = broker.router.on_message(source, &raw).await;

    assert_eq!(delivered, 6);
    for mut rx in receivers {
        let mut copies = 0;
        while let Ok(frame) = rx.try_recv() {
            if matches!(frame, OutboundFrame::Event(_)) {
                copies += 1;
            }
        }
        assert_eq!(copies, 1);
    }
}

#[tokio::test]
async fn malformed_frames_do_not_crash_or_broadcast() {
    let broker = broker();
    let (tx, _rx) = mpsc::unbounded_channel();
    let source = broker.registry.register(tx).await;
    let mut observer = TestClient::connect(
        &broker,
        ClientRole::Admin {
            organization_id: OrganizationId::new("org-a"),
        },
    )
    .await;

    for bad in ["", "garbage", "[]", "42", r#"{"kind":"newOrder"}"#] {
        assert_eq!(broker.router.on_message(source, bad).await, 0);
    }
    assert!(observer.queued_events().is_empty());

    // The offending connection is still registered and functional.
    assert!(broker.registry.is_registered(&source).await);
    let raw = serde_json::to_string(&WireEvent::NewOrder {
        order: order_for_table("8", "org-a", 1),
    })
    .unwrap();
    assert!(broker.router.on_message(source, &raw).await >= 1);
    assert_eq!(observer.queued_events().len(), 1);
}

// =============================================================================
// Heartbeat eviction
// =============================================================================

#[tokio::test]
async fn silent_connection_stops_receiving_broadcasts_after_eviction() {
    let broker = broker();
    let monitor = HeartbeatMonitor::new(broker.registry.clone(), Duration::from_secs(30));

    let (silent_tx, mut silent_rx) = mpsc::unbounded_channel();
    let silent = broker.registry.register(silent_tx).await;
    let (live_tx, mut live_rx) = mpsc::unbounded_channel();
    let live = broker.registry.register(live_tx).await;

    // Two sweeps with only the live connection answering pings.
    monitor.sweep().await;
    broker.registry.mark_alive(&live).await;
    monitor.sweep().await;
    broker.registry.mark_alive(&live).await;

    assert!(!broker.registry.is_registered(&silent).await);
    assert!(broker.registry.is_registered(&live).await);

    broker
        .service
        .place_order(order_for_table("9", "org-a", 4))
        .await
        .unwrap();

    // The survivor gets the event; the evicted channel got Close and
    // nothing after it.
    let mut live_events = 0;
    while let Ok(frame) = live_rx.try_recv() {
        if matches!(frame, OutboundFrame::Event(_)) {
            live_events += 1;
        }
    }
    assert_eq!(live_events, 1);

    let mut saw_close = false;
    while let Ok(frame) = silent_rx.try_recv() {
        match frame {
            OutboundFrame::Close => saw_close = true,
            OutboundFrame::Event(_) => panic!("evicted connection received a broadcast"),
            OutboundFrame::Ping => {}
        }
    }
    assert!(saw_close);
}

// =============================================================================
// Scenario: reconnect with resubscribe
// =============================================================================

/// Transport wired straight into the broker: frames the client sends go
/// through the router, frames the router fans out come back through the
/// registry channel.
struct LoopbackTransport {
    router: Arc<BroadcastRouter>,
    id: ConnectionId,
    rx: mpsc::UnboundedReceiver<OutboundFrame>,
}

#[async_trait::async_trait]
impl EventTransport for LoopbackTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        // The router handles subscribe frames itself, exactly as the
        // socket handler would.
        self.router.on_message(self.id, &frame).await;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        match self.rx.recv().await {
            Some(OutboundFrame::Event(raw)) => Some(Ok(raw)),
            Some(OutboundFrame::Ping) => Some(Ok(String::new())), // dropped as malformed
            Some(OutboundFrame::Close) | None => None,
        }
    }
}

struct LoopbackConnector {
    registry: Arc<ConnectionRegistry>,
    router: Arc<BroadcastRouter>,
}

#[async_trait::async_trait]
impl TransportConnector for LoopbackConnector {
    async fn connect(&self) -> Result<Box<dyn EventTransport>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.registry.register(tx).await;
        Ok(Box::new(LoopbackTransport {
            router: self.router.clone(),
            id,
            rx,
        }))
    }
}

#[tokio::test]
async fn reconnecting_client_resubscribes_and_catches_new_events() {
    let broker = broker();
    let engine = Arc::new(Mutex::new(ReconciliationEngine::new(
        ClientRole::Admin {
            organization_id: OrganizationId::new("org-a"),
        },
        broker.store.clone(),
    )));
    let connector = Arc::new(LoopbackConnector {
        registry: broker.registry.clone(),
        router: broker.router.clone(),
    });
    let supervisor = ReconnectSupervisor::with_delay(
        connector,
        engine.clone(),
        Duration::from_millis(20),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(supervisor.run(shutdown_rx));

    // Wait for the first session to subscribe.
    wait_until(|| async { broker.registry.connection_count().await == 1 }).await;

    broker
        .service
        .place_order(order_for_table("5", "org-a", 3))
        .await
        .unwrap();
    wait_until(|| async { !engine.lock().await.orders().is_empty() }).await;

    // Kill the connection the way a heartbeat eviction would.
    broker.registry.probe_all().await;
    let evicted = broker.registry.evict_stale().await;
    assert_eq!(evicted.len(), 1);

    // The supervisor reconnects and resubscribes on its own; an event
    // sent during the gap is lost (at-most-once), later ones arrive.
    wait_until(|| async { broker.registry.connection_count().await == 1 }).await;
    broker
        .service
        .update_status("5", OrderStatus::Preparing, "back online", "admin-1")
        .await
        .unwrap();
    wait_until(|| async {
        engine.lock().await.orders()[0].status == OrderStatus::Preparing
    })
    .await;

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("supervisor should stop")
        .unwrap();
}

/// Polls an async condition with a deadline.
async fn wait_until<F, Fut>(mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if cond().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within deadline");
}
