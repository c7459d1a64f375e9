//! Client session phases.

use crate::domain::foundation::StateMachine;

/// Lifecycle of one client's broker session.
///
/// `Disconnected → Connecting → Subscribed → Receiving`, with a drop back
/// to `Disconnected` from anywhere when the transport closes. The
/// Reconnection Supervisor owns the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Subscribed,
    Receiving,
}

impl StateMachine for SessionPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Subscribed)
                | (Subscribed, Receiving)
                | (Connecting, Disconnected)
                | (Subscribed, Disconnected)
                | (Receiving, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionPhase::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Subscribed, Disconnected],
            Subscribed => vec![Receiving, Disconnected],
            Receiving => vec![Disconnected],
        }
    }
}
