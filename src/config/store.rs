//! Durable store configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// PostgreSQL connection configuration for the durable order store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Database connection URL.
    pub url: String,

    /// Maximum connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Page size for order listings. Not read by the broker itself;
    /// clients pass it to `ReconciliationEngine::with_page_size` when
    /// sizing their "load more" pages.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl StoreConfig {
    /// Validate store configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.page_size == 0 || self.page_size > 200 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_page_size() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_urls_pass() {
        let config = StoreConfig {
            url: "postgres://user:pw@localhost/ordercast".to_string(),
            max_connections: default_max_connections(),
            page_size: default_page_size(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_postgres_url_fails() {
        let config = StoreConfig {
            url: "mysql://localhost".to_string(),
            max_connections: 10,
            page_size: 20,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));
    }

    #[test]
    fn oversized_page_fails() {
        let config = StoreConfig {
            url: "postgres://localhost".to_string(),
            max_connections: 10,
            page_size: 500,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPageSize));
    }
}
