//! Domain layer: value objects and entities with no I/O dependencies.

pub mod foundation;
pub mod order;
