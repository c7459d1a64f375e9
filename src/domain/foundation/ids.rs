//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical order identifier in the form `ORD-<digits>`.
///
/// Order ids arrive from several code paths (numeric counters, prefixed
/// strings, ids copy-pasted through UI layers), so every boundary that
/// compares ids must go through [`OrderId::normalize`] first. Lookups that
/// skip normalization silently miss and lose updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Canonicalizes an arbitrary order-id spelling.
    ///
    /// Total function, never fails:
    /// - already `ORD-<digits>` is returned unchanged;
    /// - a purely numeric string is prefixed with `ORD-`;
    /// - anything else has every non-digit stripped and the remainder
    ///   prefixed with `ORD-`;
    /// - empty input maps to an empty id, which callers must treat as
    ///   invalid separately (see [`OrderId::is_valid`]).
    pub fn normalize(raw: &str) -> Self {
        if raw.is_empty() {
            return Self(String::new());
        }
        if let Some(rest) = raw.strip_prefix("ORD-") {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return Self(raw.to_string());
            }
        }
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Self(String::new());
        }
        Self(format!("ORD-{}", digits))
    }

    /// Returns true if this id carries at least one digit.
    ///
    /// Normalization of garbage input (empty string, no digits at all)
    /// yields an empty id that must not be used for lookups.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns the canonical id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

/// Tenant identifier scoping orders and events to one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Creates an organization id from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrganizationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrganizationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of the customer who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a customer id from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a live transport connection.
///
/// Generated broker-side at accept time; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
