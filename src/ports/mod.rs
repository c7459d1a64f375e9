//! Ports: async trait seams between the core and its collaborators.

mod activity_log;
mod order_store;
mod transport;

pub use activity_log::{ActivityAction, ActivityEntry, ActivityLog};
pub use order_store::{OrderScope, OrderStore, StoreError};
pub use transport::{EventTransport, TransportConnector, TransportError};
