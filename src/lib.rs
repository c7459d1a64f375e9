//! Ordercast - Realtime core for a restaurant table-ordering platform
//!
//! This crate implements the broadcast broker that relays new-order and
//! status-update events between customer clients and admin dashboards, plus
//! the client-side reconciliation logic that keeps cached order lists
//! consistent with the durable store.

pub mod adapters;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
