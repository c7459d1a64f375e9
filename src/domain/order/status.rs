//! Order status lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of an order.
///
/// The kitchen-facing flow is pending → preparing → ready → completed, with
/// delayed as a sidetrack out of pending and cancellation possible until the
/// order completes. Cancelled and completed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delayed,
    Cancelled,
    Completed,
}

impl OrderStatus {
    /// Parses a status from its wire spelling.
    ///
    /// Returns `None` for unknown spellings; callers decide whether that is
    /// a dropped event or a hard error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "delayed" => Some(Self::Delayed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Wire spelling of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delayed => "delayed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Preparing)
                | (Pending, Delayed)
                | (Pending, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Delayed, Ready)
                | (Delayed, Preparing)
                | (Delayed, Cancelled)
                | (Ready, Completed)
                | (Ready, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Preparing, Delayed, Cancelled],
            Preparing => vec![Ready, Cancelled],
            Delayed => vec![Ready, Preparing, Cancelled],
            Ready => vec![Completed, Cancelled],
            Cancelled | Completed => vec![],
        }
    }
}
