//! Backend connectors.
//!
//! # Data Flow
//! ```text
//! ConnectionMonitor (health/monitor.rs)
//!     → Connector::connect   (dial, returns an owned handle)
//!     → Connector::heartbeat (one round-trip on the handle)
//!     → Connector::close     (before the handle is replaced)
//! ```
//!
//! # Design Decisions
//! - Connectors are stateless dialers; the monitor owns the handle
//! - Deadlines are enforced by the monitor, not by each connector
//! - Cache payload helpers live in store.rs and are not supervised

pub mod cache;
pub mod store;
pub mod tcp;
pub mod websocket;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use cache::RedisConnector;
pub use store::{CacheStore, CacheStoreError};
pub use tcp::TcpConnector;
pub use websocket::WebSocketConnector;

/// Backend name of the supervised websocket endpoint.
pub const WEBSOCKET: &str = "websocket";

/// Backend name of the supervised cache.
pub const CACHE: &str = "cache";

/// Errors raised while talking to a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Could not establish a session.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The session exists but did not answer the heartbeat.
    #[error("heartbeat failed: {0}")]
    Heartbeat(String),

    /// The call did not complete before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Dial and probe one kind of backend.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Live session owned by the monitor.
    type Handle: Send + 'static;

    async fn connect(&self) -> Result<Self::Handle, BackendError>;

    async fn heartbeat(&self, handle: &mut Self::Handle) -> Result<(), BackendError>;

    async fn close(&self, handle: Self::Handle);
}
