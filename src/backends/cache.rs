//! Redis cache connector.
//!
//! Heartbeat is a single `PING` round-trip on a multiplexed connection.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use url::Url;

use crate::backends::{BackendError, Connector};

#[derive(Clone)]
pub struct RedisConnector {
    client: redis::Client,
    url: String,
}

impl RedisConnector {
    pub fn new(url: &str) -> Result<Self, BackendError> {
        let client = redis::Client::open(url).map_err(|e| {
            BackendError::Connect(format!("invalid Redis URL '{}': {}", redact_url(url), e))
        })?;

        Ok(Self {
            client,
            url: redact_url(url),
        })
    }

    /// The configured URL with any password masked.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for RedisConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnector")
            .field("url", &self.url)
            .finish()
    }
}

#[async_trait]
impl Connector for RedisConnector {
    type Handle = MultiplexedConnection;

    async fn connect(&self) -> Result<MultiplexedConnection, BackendError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BackendError::Connect(format!("{}: {}", self.url, e)))?;

        // A fresh connection only counts once the server has answered.
        ping(&mut conn).await.map_err(|e| BackendError::Connect(e.to_string()))?;

        tracing::debug!(url = %self.url, "Redis connection established");
        Ok(conn)
    }

    async fn heartbeat(&self, handle: &mut MultiplexedConnection) -> Result<(), BackendError> {
        ping(handle).await
    }

    async fn close(&self, handle: MultiplexedConnection) {
        drop(handle);
    }
}

async fn ping(conn: &mut MultiplexedConnection) -> Result<(), BackendError> {
    let pong: String = redis::cmd("PING")
        .query_async(conn)
        .await
        .map_err(|e| BackendError::Heartbeat(format!("PING: {}", e)))?;

    if pong == "PONG" {
        Ok(())
    } else {
        Err(BackendError::Heartbeat(format!("unexpected PING reply '{}'", pong)))
    }
}

/// Redact credentials from a Redis URL for logging.
pub(crate) fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_err() {
                return "***".to_string();
            }
            url.to_string()
        }
        Ok(_) => raw.to_string(),
        // Userinfo ends at the last '@'.
        Err(_) => match raw.rfind('@') {
            Some(at) => format!("***{}", &raw[at..]),
            None => raw.to_string(),
        },
    }
}
