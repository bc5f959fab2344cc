//! Startup orchestration.
//!
//! # Responsibilities
//! - Build one monitor per configured backend
//! - Hand them to the supervisor, which connects required ones first
//!
//! # Design Decisions
//! - Fail fast: a required backend that cannot connect aborts startup
//! - Cache tolerates no heartbeat failure; websocket tolerates `ws_ping_max_error`
//! - Brokers use the cache's tolerance of one

use crate::backends::{RedisConnector, TcpConnector, WebSocketConnector, CACHE, WEBSOCKET};
use crate::config::ProbeConfig;
use crate::health::{ConnectionMonitor, HeartbeatConfig, Supervisor, SupervisorError};
use crate::lifecycle::Shutdown;
use crate::resilience::BackoffPolicy;

/// Build and start supervision for every backend in `config`.
pub async fn start_supervisor(config: &ProbeConfig, shutdown: &Shutdown) -> Result<Supervisor, SupervisorError> {
    let backoff = BackoffPolicy::from(&config.retry);
    let mut builder = Supervisor::builder(config.health.poll_interval());

    if let Some(cache) = &config.cache {
        let connector = RedisConnector::new(&cache.url).map_err(|e| SupervisorError::Backend {
            backend: CACHE.to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(url = %connector.url(), "Supervising cache");
        let monitor = ConnectionMonitor::new(
            CACHE,
            connector,
            backoff,
            HeartbeatConfig::new(cache.heartbeat_period(), 1, cache.timeout()),
        );
        builder = builder.supervise(monitor, cache.required_at_startup);
    }

    if let Some(ws) = &config.websocket {
        tracing::info!(url = %ws.url, "Supervising websocket");
        let monitor = ConnectionMonitor::new(
            WEBSOCKET,
            WebSocketConnector::new(ws.url.clone()),
            backoff,
            HeartbeatConfig::new(ws.ping_period(), ws.ws_ping_max_error, ws.timeout()),
        );
        builder = builder.supervise(monitor, ws.required_at_startup);
    }

    for broker in &config.brokers {
        tracing::info!(broker = %broker.name, addresses = ?broker.addresses, "Supervising broker");
        let monitor = ConnectionMonitor::new(
            broker.name.clone(),
            TcpConnector::new(broker.addresses.clone()),
            backoff,
            HeartbeatConfig::new(broker.heartbeat_period(), 1, broker.timeout()),
        );
        builder = builder.supervise(monitor, broker.required_at_startup);
    }

    builder.start(shutdown).await
}
