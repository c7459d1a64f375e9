//! Adapters: concrete implementations of the ports plus the broker's
//! transport surface.

pub mod memory;
pub mod postgres;
pub mod websocket;
