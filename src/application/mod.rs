//! Application layer: the order write path.

mod order_service;

pub use order_service::OrderService;
