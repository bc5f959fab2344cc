//! Metrics collection and exposition.
//!
//! # Metrics
//! - `liveprobe_backend_connected` (gauge): 1=connected, 0=not, by backend
//! - `liveprobe_heartbeat_failures_total` (counter): by backend
//! - `liveprobe_reconnects_total` (counter): reconnect cycles started, by backend
//! - `liveprobe_probe_requests_total` (counter): by route, status
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use ::metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_backend_connected(backend: &str, connected: bool) {
    gauge!("liveprobe_backend_connected", "backend" => backend.to_string())
        .set(if connected { 1.0 } else { 0.0 });
}

pub fn record_heartbeat_failure(backend: &str) {
    counter!("liveprobe_heartbeat_failures_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_reconnect(backend: &str) {
    counter!("liveprobe_reconnects_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_probe(route: &'static str, status: u16) {
    counter!(
        "liveprobe_probe_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}
