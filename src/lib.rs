//! Liveness/readiness sidecar library.
//!
//! Supervises long-lived backend connections (websocket feed, Redis cache,
//! broker clusters) and answers `/live` and `/read` from the aggregated view.

pub mod backends;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ProbeConfig;
pub use health::{ProbeStatus, Supervisor};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
