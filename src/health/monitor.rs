//! Per-backend connection supervision.
//!
//! # Responsibilities
//! - Own the single live handle to one backend
//! - Establish it with linear backoff, up to the retry budget
//! - Run the heartbeat on a periodic timer
//! - Reconnect once consecutive failures reach the tolerance
//! - Publish every transition through `ConnectionState`
//!
//! # Design Decisions
//! - One generic loop; backends differ only in `Connector` and tolerance
//! - State flips to `Reconnecting` before the first retry is attempted
//! - Exhausting the budget ends the loop with `MonitorError`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::backends::{BackendError, Connector};
use crate::health::state::{ConnectionPhase, ConnectionState};
use crate::observability::metrics;
use crate::resilience::BackoffPolicy;

/// Longest heartbeat period the loop will schedule.
pub const MAX_HEARTBEAT_PERIOD: Duration = Duration::from_secs(86_400);

/// Heartbeat cadence and failure tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub period: Duration,
    /// Consecutive failures before the handle is dropped; 1 means no tolerance.
    pub max_consecutive_failures: u32,
    /// Deadline for one connect attempt or heartbeat.
    pub timeout: Duration,
}

impl HeartbeatConfig {
    pub fn new(period: Duration, max_consecutive_failures: u32, timeout: Duration) -> Self {
        Self {
            period,
            max_consecutive_failures: max_consecutive_failures.max(1),
            timeout,
        }
    }
}

/// Fatal supervision errors.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{backend}: gave up after {attempts} connect attempts: {source}")]
    RetriesExhausted {
        backend: String,
        attempts: u32,
        source: BackendError,
    },

    #[error("{backend}: supervision task aborted: {message}")]
    Aborted { backend: String, message: String },
}

impl MonitorError {
    pub fn backend(&self) -> &str {
        match self {
            MonitorError::RetriesExhausted { backend, .. }
            | MonitorError::Aborted { backend, .. } => backend,
        }
    }
}

/// Supervises one backend connection.
pub struct ConnectionMonitor<C: Connector> {
    name: String,
    connector: C,
    backoff: BackoffPolicy,
    heartbeat: HeartbeatConfig,
    state: Arc<ConnectionState>,
    handle: Option<C::Handle>,
    consecutive_failures: u32,
}

impl<C: Connector> ConnectionMonitor<C> {
    pub fn new(
        name: impl Into<String>,
        connector: C,
        backoff: BackoffPolicy,
        heartbeat: HeartbeatConfig,
    ) -> Self {
        Self {
            name: name.into(),
            connector,
            backoff,
            heartbeat,
            state: Arc::new(ConnectionState::new()),
            handle: None,
            consecutive_failures: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared read side of this monitor's state.
    pub fn state(&self) -> Arc<ConnectionState> {
        self.state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Establish the connection, replacing any existing handle.
    pub async fn connect(&mut self) -> Result<(), MonitorError> {
        self.establish(ConnectionPhase::Connecting).await
    }

    /// Run one heartbeat, reconnecting if the tolerance is used up.
    pub async fn tick(&mut self) -> Result<(), MonitorError> {
        let Some(handle) = self.handle.as_mut() else {
            return self.establish(ConnectionPhase::Reconnecting).await;
        };

        let result = match time::timeout(self.heartbeat.timeout, self.connector.heartbeat(handle)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.heartbeat.timeout)),
        };

        match result {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    tracing::debug!(
                        backend = %self.name,
                        failures = self.consecutive_failures,
                        "Heartbeat recovered"
                    );
                }
                self.consecutive_failures = 0;
                Ok(())
            }
            Err(e) => {
                self.consecutive_failures += 1;
                metrics::record_heartbeat_failure(&self.name);
                tracing::warn!(
                    backend = %self.name,
                    failures = self.consecutive_failures,
                    max_failures = self.heartbeat.max_consecutive_failures,
                    error = %e,
                    "Heartbeat failed"
                );

                if self.consecutive_failures < self.heartbeat.max_consecutive_failures {
                    return Ok(());
                }

                tracing::warn!(backend = %self.name, "Heartbeat failure threshold reached, reconnecting");
                metrics::record_reconnect(&self.name);
                self.establish(ConnectionPhase::Reconnecting).await
            }
        }
    }

    /// Run the heartbeat loop until shutdown or a fatal error.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), MonitorError> {
        tracing::info!(
            backend = %self.name,
            period = ?self.heartbeat.period,
            max_failures = self.heartbeat.max_consecutive_failures,
            "Connection monitor starting"
        );

        if self.handle.is_none() {
            tokio::select! {
                result = self.connect() => result?,
                _ = shutdown.recv() => {
                    self.teardown().await;
                    return Ok(());
                }
            }
        }

        let period = self
            .heartbeat
            .period
            .clamp(Duration::from_millis(1), MAX_HEARTBEAT_PERIOD);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                result = self.tick() => result?,
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(backend = %self.name, "Connection monitor received shutdown signal, exiting loop");
        self.teardown().await;
        Ok(())
    }

    /// Close the handle, if any, and publish `Disconnected`.
    pub async fn disconnect(&mut self) {
        self.teardown().await;
    }

    async fn establish(&mut self, phase: ConnectionPhase) -> Result<(), MonitorError> {
        self.publish(phase);

        if let Some(stale) = self.handle.take() {
            self.connector.close(stale).await;
        }

        let attempts = self.backoff.max_attempts();
        let mut last_error = BackendError::Connect("no attempt made".into());

        for attempt in 0..attempts {
            if attempt > 0 {
                let wait = self.backoff.wait(attempt);
                tracing::info!(
                    backend = %self.name,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay = ?wait,
                    "Retrying connect"
                );
                time::sleep(wait).await;
            }

            let result = match time::timeout(self.heartbeat.timeout, self.connector.connect()).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout(self.heartbeat.timeout)),
            };

            match result {
                Ok(handle) => {
                    self.handle = Some(handle);
                    self.consecutive_failures = 0;
                    self.publish(ConnectionPhase::Connected);
                    tracing::info!(backend = %self.name, attempts = attempt + 1, "Connected");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        backend = %self.name,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %e,
                        "Connect attempt failed"
                    );
                    last_error = e;
                }
            }
        }

        self.publish(ConnectionPhase::Failed);
        tracing::error!(backend = %self.name, attempts, "Retry budget exhausted");
        Err(MonitorError::RetriesExhausted {
            backend: self.name.clone(),
            attempts,
            source: last_error,
        })
    }

    async fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.connector.close(handle).await;
        }
        self.publish(ConnectionPhase::Disconnected);
    }

    fn publish(&self, phase: ConnectionPhase) {
        let previous = self.state.publish(phase);
        if previous != phase {
            tracing::debug!(backend = %self.name, from = ?previous, to = ?phase, "Connection phase changed");
            metrics::record_backend_connected(&self.name, phase == ConnectionPhase::Connected);
        }
    }
}

/// Object-safe view of a monitor, used by the supervisor.
#[async_trait]
pub trait Supervised: Send {
    fn name(&self) -> &str;

    fn state(&self) -> Arc<ConnectionState>;

    async fn connect(&mut self) -> Result<(), MonitorError>;

    async fn disconnect(&mut self);

    async fn run(self: Box<Self>, shutdown: broadcast::Receiver<()>) -> Result<(), MonitorError>;
}

#[async_trait]
impl<C: Connector> Supervised for ConnectionMonitor<C> {
    fn name(&self) -> &str {
        ConnectionMonitor::name(self)
    }

    fn state(&self) -> Arc<ConnectionState> {
        ConnectionMonitor::state(self)
    }

    async fn connect(&mut self) -> Result<(), MonitorError> {
        ConnectionMonitor::connect(self).await
    }

    async fn disconnect(&mut self) {
        ConnectionMonitor::disconnect(self).await
    }

    async fn run(self: Box<Self>, shutdown: broadcast::Receiver<()>) -> Result<(), MonitorError> {
        ConnectionMonitor::run(*self, shutdown).await
    }
}
