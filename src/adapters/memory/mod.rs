//! In-memory adapters for tests and local development.

mod activity_log;
mod order_store;

pub use activity_log::InMemoryActivityLog;
pub use order_store::InMemoryOrderStore;
