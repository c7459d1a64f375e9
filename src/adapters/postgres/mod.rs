//! PostgreSQL adapters for the durable store ports.

mod activity_log;
mod order_store;

pub use activity_log::PostgresActivityLog;
pub use order_store::PostgresOrderStore;
