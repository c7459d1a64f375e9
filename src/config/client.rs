//! Client-side connection configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration for clients connecting back to the broker.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Broker websocket URL to (re)connect to.
    #[serde(default = "default_broker_url")]
    pub broker_url: String,

    /// Seconds to wait between reconnect attempts.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl ClientConfig {
    /// Reconnect delay as a `Duration`.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Validate client configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.broker_url.starts_with("ws://") && !self.broker_url.starts_with("wss://") {
            return Err(ValidationError::InvalidBrokerUrl);
        }
        if self.reconnect_delay_secs == 0 || self.reconnect_delay_secs > 60 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

fn default_broker_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_reconnect_delay() -> u64 {
    3
}
