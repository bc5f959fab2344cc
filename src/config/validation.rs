//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (durations within 1s..=1 day, thresholds >= 1)
//! - Check URL schemes and socket addresses
//! - Detect duplicate backend names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProbeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProbeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Upper bound for any configured duration: one day.
pub const MAX_SECS: u64 = 86_400;

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProbeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app_name.trim().is_empty() {
        errors.push(ValidationError::new("app_name", "must not be empty"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    check_secs(&mut errors, "listener.request_timeout_secs", config.listener.request_timeout_secs);
    check_secs(&mut errors, "retry.max_wait_secs", config.retry.max_wait_secs);
    check_secs(&mut errors, "lifecycle.shutdown_grace_secs", config.lifecycle.shutdown_grace_secs);

    if config.health.poll_interval_ms == 0 || config.health.poll_interval_ms > MAX_SECS * 1000 {
        errors.push(ValidationError::new(
            "health.poll_interval_ms",
            format!("must be between 1 and {}", MAX_SECS * 1000),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let mut names = HashSet::new();

    if let Some(ws) = &config.websocket {
        names.insert(crate::backends::WEBSOCKET.to_string());
        check_url(&mut errors, "websocket.url", &ws.url, &["ws"]);
        check_secs(&mut errors, "websocket.ws_ping_period_secs", ws.ws_ping_period_secs);
        if ws.ws_ping_max_error == 0 {
            errors.push(ValidationError::new("websocket.ws_ping_max_error", "must be at least 1"));
        }
        check_secs(&mut errors, "websocket.timeout_secs", ws.timeout_secs);
    }

    if let Some(cache) = &config.cache {
        names.insert(crate::backends::CACHE.to_string());
        check_url(&mut errors, "cache.url", &cache.url, &["redis"]);
        check_secs(&mut errors, "cache.heartbeat_period_secs", cache.heartbeat_period_secs);
        check_secs(&mut errors, "cache.timeout_secs", cache.timeout_secs);
    }

    for (i, broker) in config.brokers.iter().enumerate() {
        let field = format!("brokers[{}]", i);
        if broker.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !names.insert(broker.name.clone()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate backend name '{}'", broker.name),
            ));
        }
        if broker.addresses.is_empty() {
            errors.push(ValidationError::new(format!("{}.addresses", field), "must not be empty"));
        }
        check_secs(
            &mut errors,
            &format!("{}.heartbeat_period_secs", field),
            broker.heartbeat_period_secs,
        );
        check_secs(&mut errors, &format!("{}.timeout_secs", field), broker.timeout_secs);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Periods, timeouts and waits must lie in `1..=MAX_SECS`.
fn check_secs(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 || value > MAX_SECS {
        errors.push(ValidationError::new(
            field,
            format!("must be between 1 and {} seconds, got {}", MAX_SECS, value),
        ));
    }
}

/// TLS schemes are rejected: no TLS backend is compiled in.
fn check_url(errors: &mut Vec<ValidationError>, field: &str, raw: &str, schemes: &[&str]) {
    match Url::parse(raw) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) if matches!(url.scheme(), "wss" | "rediss") => errors.push(ValidationError::new(
            field,
            format!("scheme '{}' requires TLS, which this build does not support", url.scheme()),
        )),
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("scheme '{}' is not one of {:?}", url.scheme(), schemes),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BrokerConfig, CacheConfig, WebSocketConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProbeConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProbeConfig::default();
        config.app_name = " ".into();
        config.listener.bind_address = "not-an-address".into();
        config.websocket = Some(WebSocketConfig {
            url: "http://feed.example.com".into(),
            ws_ping_max_error: 0,
            ..WebSocketConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["app_name", "listener.bind_address", "websocket.url", "websocket.ws_ping_max_error"]
        );
    }

    #[test]
    fn test_rejects_bad_cache_scheme() {
        let mut config = ProbeConfig::default();
        config.cache = Some(CacheConfig {
            url: "memcached://cache:11211".into(),
            ..CacheConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("cache.url"));
    }

    #[test]
    fn test_rejects_unbounded_durations() {
        let mut config = ProbeConfig::default();
        config.websocket = Some(WebSocketConfig {
            ws_ping_period_secs: 9_223_372_036_854_775_807,
            ..WebSocketConfig::default()
        });
        config.cache = Some(CacheConfig {
            timeout_secs: MAX_SECS + 1,
            ..CacheConfig::default()
        });
        config.retry.max_wait_secs = u64::MAX;
        config.health.poll_interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "retry.max_wait_secs",
                "health.poll_interval_ms",
                "websocket.ws_ping_period_secs",
                "cache.timeout_secs",
            ]
        );
    }

    #[test]
    fn test_accepts_one_day_bound() {
        let mut config = ProbeConfig::default();
        config.websocket = Some(WebSocketConfig {
            ws_ping_period_secs: MAX_SECS,
            ..WebSocketConfig::default()
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_tls_schemes() {
        let mut config = ProbeConfig::default();
        config.websocket = Some(WebSocketConfig {
            url: "wss://stream.example.com/ws".into(),
            ..WebSocketConfig::default()
        });
        config.cache = Some(CacheConfig {
            url: "rediss://cache:6380".into(),
            ..CacheConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("requires TLS")));
    }

    #[test]
    fn test_rejects_duplicate_backend_names() {
        let mut config = ProbeConfig::default();
        config.cache = Some(CacheConfig::default());
        config.brokers.push(BrokerConfig {
            name: "cache".into(),
            addresses: vec!["127.0.0.1:4222".into()],
            heartbeat_period_secs: 5,
            timeout_secs: 2,
            required_at_startup: false,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate backend name"));
    }
}
