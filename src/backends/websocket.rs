//! WebSocket endpoint connector.
//!
//! Heartbeat is a ping frame. Frames already buffered from the server are
//! drained first so a close frame or a dead stream is noticed on the next tick.

use async_trait::async_trait;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::backends::{BackendError, Connector};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on buffered frames inspected per heartbeat.
const MAX_DRAINED_FRAMES: usize = 64;

#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    type Handle = WsStream;

    async fn connect(&self) -> Result<WsStream, BackendError> {
        let (stream, response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| BackendError::Connect(format!("{}: {}", self.url, e)))?;

        tracing::debug!(url = %self.url, status = %response.status(), "WebSocket handshake complete");
        Ok(stream)
    }

    async fn heartbeat(&self, handle: &mut WsStream) -> Result<(), BackendError> {
        drain_incoming(handle)?;

        handle
            .send(Message::Ping(Default::default()))
            .await
            .map_err(|e| BackendError::Heartbeat(format!("ping: {}", e)))
    }

    async fn close(&self, mut handle: WsStream) {
        if let Err(e) = handle.close(None).await {
            tracing::debug!(url = %self.url, error = %e, "WebSocket close failed");
        }
    }
}

/// Consume frames that are already available without waiting for more.
fn drain_incoming(handle: &mut WsStream) -> Result<(), BackendError> {
    for _ in 0..MAX_DRAINED_FRAMES {
        match handle.next().now_or_never() {
            None => return Ok(()),
            Some(None) => return Err(BackendError::Heartbeat("stream ended".into())),
            Some(Some(Err(e))) => return Err(BackendError::Heartbeat(e.to_string())),
            Some(Some(Ok(Message::Close(frame)))) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .unwrap_or_else(|| "no reason".to_string());
                return Err(BackendError::Heartbeat(format!("closed by server: {}", reason)));
            }
            Some(Some(Ok(_))) => {}
        }
    }
    Ok(())
}
