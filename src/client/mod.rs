//! Client-side logic: session phases, reconciliation, reconnection.
//!
//! Everything here runs on the customer or admin side of the wire. The
//! broker never depends on this module.

pub mod reconciliation;
pub mod reconnect;
pub mod session;

pub use reconciliation::{
    ClientRole, EventOutcome, ReconciliationEngine, DEFAULT_PAGE_SIZE,
};
pub use reconnect::{ReconnectSupervisor, DEFAULT_RECONNECT_DELAY};
pub use session::SessionPhase;
