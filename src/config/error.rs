//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors raised by semantic validation of loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Server port must be non-zero")]
    InvalidPort,

    #[error("Heartbeat interval must be between 1 and 300 seconds")]
    InvalidHeartbeatInterval,

    #[error("Database URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("Page size must be between 1 and 200")]
    InvalidPageSize,

    #[error("Reconnect delay must be between 1 and 60 seconds")]
    InvalidReconnectDelay,

    #[error("Broker URL must start with ws:// or wss://")]
    InvalidBrokerUrl,
}
