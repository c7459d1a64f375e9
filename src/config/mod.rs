//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `ORDERCAST`
//! prefix and `__` (double underscore) separating nested keys:
//!
//! - `ORDERCAST__SERVER__PORT=8080` -> `server.port = 8080`
//! - `ORDERCAST__STORE__URL=postgres://...` -> `store.url = ...`

mod client;
mod error;
mod server;
mod store;

pub use client::ClientConfig;
pub use error::{ConfigError, ValidationError};
pub use server::ServerConfig;
pub use store::StoreConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Broker server configuration (bind address, heartbeat).
    #[serde(default)]
    pub server: ServerConfig,

    /// Durable order store configuration (PostgreSQL).
    pub store: StoreConfig,

    /// Client reconnect configuration.
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file first if present (development convenience).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ORDERCAST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.store.validate()?;
        self.client.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_validates() {
        let config = AppConfig {
            server: ServerConfig::default(),
            store: StoreConfig {
                url: "postgres://localhost/ordercast".to_string(),
                max_connections: 10,
                page_size: 20,
            },
            client: ClientConfig::default(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_section_fails_validation() {
        let config = AppConfig {
            server: ServerConfig {
                heartbeat_interval_secs: 0,
                ..Default::default()
            },
            store: StoreConfig {
                url: "postgres://localhost/ordercast".to_string(),
                max_connections: 10,
                page_size: 20,
            },
            client: ClientConfig::default(),
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidHeartbeatInterval)
        );
    }
}
