//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the probe.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the probe process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Name reported by the welcome and not-found routes.
    pub app_name: String,

    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Reconnect budget shared by every supervised backend.
    pub retry: RetryConfig,

    /// Duplex socket endpoint, if one is supervised.
    pub websocket: Option<WebSocketConfig>,

    /// Key-value cache, if one is supervised.
    pub cache: Option<CacheConfig>,

    /// Message brokers supervised for plain TCP reachability.
    pub brokers: Vec<BrokerConfig>,

    /// Aggregator settings.
    pub health: HealthConfig,

    /// Shutdown behaviour.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            app_name: "liveprobe".to_string(),
            listener: ListenerConfig::default(),
            retry: RetryConfig::default(),
            websocket: None,
            cache: None,
            brokers: Vec::new(),
            health: HealthConfig::default(),
            lifecycle: LifecycleConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on a single probe request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Reconnect policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Connect attempts per reconnect cycle before the backend is declared dead.
    pub max_retry: u32,

    /// Backoff unit in seconds; attempt `n` waits `n * max_wait_secs`.
    pub max_wait_secs: u64,
}

impl RetryConfig {
    pub fn unit_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry: 5,
            max_wait_secs: 2,
        }
    }
}

/// WebSocket endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Server URL (`ws://`).
    pub url: String,

    /// Interval between ping frames, in seconds.
    pub ws_ping_period_secs: u64,

    /// Consecutive ping failures tolerated before reconnecting.
    pub ws_ping_max_error: u32,

    /// Deadline for a single dial or ping, in seconds.
    pub timeout_secs: u64,

    /// Whether a failed initial connect aborts startup.
    pub required_at_startup: bool,
}

impl WebSocketConfig {
    pub fn ping_period(&self) -> Duration {
        Duration::from_secs(self.ws_ping_period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/ws".to_string(),
            ws_ping_period_secs: 10,
            ws_ping_max_error: 3,
            timeout_secs: 5,
            required_at_startup: true,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis URL (`redis://`).
    pub url: String,

    /// Interval between `PING` round-trips, in seconds.
    pub heartbeat_period_secs: u64,

    /// Deadline for a single dial or ping, in seconds.
    pub timeout_secs: u64,

    /// Whether a failed initial connect aborts startup.
    pub required_at_startup: bool,
}

impl CacheConfig {
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            heartbeat_period_secs: 1,
            timeout_secs: 2,
            required_at_startup: true,
        }
    }
}

/// A broker cluster supervised for TCP reachability.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    /// Backend name used in logs, metrics and probe errors.
    pub name: String,

    /// `host:port` addresses, tried in order.
    pub addresses: Vec<String>,

    #[serde(default = "default_broker_period")]
    pub heartbeat_period_secs: u64,

    #[serde(default = "default_broker_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub required_at_startup: bool,
}

impl BrokerConfig {
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_broker_period() -> u64 {
    5
}

fn default_broker_timeout() -> u64 {
    2
}

/// Aggregator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// How often the aggregator polls every monitor, in milliseconds.
    pub poll_interval_ms: u64,
}

impl HealthConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl LifecycleConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
