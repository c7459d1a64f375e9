//! Ordercast broker binary.
//!
//! Boots the websocket broker: config, tracing, Postgres pool, connection
//! registry, broadcast router, heartbeat monitor, and the axum server.

use std::sync::Arc;

use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ordercast::adapters::websocket::{
    broker_router, BroadcastRouter, BrokerState, ConnectionRegistry, HeartbeatMonitor,
};
use ordercast::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.store.max_connections)
        .connect(&config.store.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Connected to durable order store");

    let registry = Arc::new(ConnectionRegistry::new());
    let router = Arc::new(BroadcastRouter::new(registry.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let heartbeat = HeartbeatMonitor::new(registry.clone(), config.server.heartbeat_interval());
    let heartbeat_task = tokio::spawn(heartbeat.run(shutdown_rx));

    let cors = cors_layer(&config.server);
    let app = broker_router()
        .with_state(BrokerState::new(registry, router))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Broker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = heartbeat_task.await;

    Ok(())
}

/// CORS layer honoring `server.cors_origins`; unset means any origin.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = parse_origins(server);
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

fn parse_origins(server: &ServerConfig) -> Vec<HeaderValue> {
    server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_origins_reach_the_cors_layer() {
        let config = ServerConfig {
            cors_origins: Some("https://a.example, https://b.example".to_string()),
            ..Default::default()
        };
        let origins = parse_origins(&config);
        assert_eq!(
            origins,
            vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ]
        );
        let _layer = cors_layer(&config);
    }

    #[test]
    fn unset_origins_fall_back_to_any() {
        let config = ServerConfig::default();
        assert!(parse_origins(&config).is_empty());
        let _layer = cors_layer(&config);
    }

    #[test]
    fn unparseable_origin_is_skipped() {
        let config = ServerConfig {
            cors_origins: Some("https://a.example, bad\nvalue".to_string()),
            ..Default::default()
        };
        assert_eq!(parse_origins(&config).len(), 1);
    }
}
