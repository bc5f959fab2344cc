//! TCP reachability connector for message brokers.
//!
//! Used for broker clusters (Kafka, NATS) that have no protocol-level
//! heartbeat here: the handle is the first reachable address, and each
//! heartbeat dials it again.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::backends::{BackendError, Connector};

#[derive(Debug, Clone)]
pub struct TcpConnector {
    addresses: Vec<String>,
}

impl TcpConnector {
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    /// Address that answered the last dial.
    type Handle = String;

    async fn connect(&self) -> Result<String, BackendError> {
        let mut failures = Vec::new();

        for addr in &self.addresses {
            match TcpStream::connect(addr.as_str()).await {
                Ok(_) => return Ok(addr.clone()),
                Err(e) => failures.push(format!("{}: {}", addr, e)),
            }
        }

        if failures.is_empty() {
            return Err(BackendError::Connect("no addresses configured".into()));
        }
        Err(BackendError::Connect(failures.join("; ")))
    }

    async fn heartbeat(&self, handle: &mut String) -> Result<(), BackendError> {
        TcpStream::connect(handle.as_str())
            .await
            .map(drop)
            .map_err(|e| BackendError::Heartbeat(format!("{}: {}", handle, e)))
    }

    async fn close(&self, _handle: String) {}
}
