//! Supervisor bootstrap and the probe query.
//!
//! # Responsibilities
//! - Connect required backends synchronously before serving
//! - Spawn one heartbeat task per monitor plus the aggregator task
//! - Answer probe queries from the latest snapshot only
//! - Surface the first fatal monitor error to the process

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::backends::Connector;
use crate::health::aggregator::{AggregateHealth, HealthAggregator};
use crate::health::monitor::{ConnectionMonitor, MonitorError, Supervised};
use crate::health::state::ConnectionPhase;
use crate::lifecycle::Shutdown;

/// Startup failures.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("required backend unavailable at startup: {0}")]
    Startup(#[source] MonitorError),

    #[error("invalid backend configuration for {backend}: {message}")]
    Backend { backend: String, message: String },
}

/// Why a probe answered unhealthy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("services are not fully operational: {} unavailable", .backends.join(", "))]
    Unhealthy { backends: Vec<String> },
}

/// Answer to a liveness/readiness query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStatus {
    pub code: StatusCode,
    pub healthy: bool,
    pub error: Option<ProbeError>,
}

impl ProbeStatus {
    fn from_snapshot(snapshot: &AggregateHealth) -> Self {
        if snapshot.combined() {
            Self {
                code: StatusCode::OK,
                healthy: true,
                error: None,
            }
        } else {
            Self {
                code: StatusCode::SERVICE_UNAVAILABLE,
                healthy: false,
                error: Some(ProbeError::Unhealthy {
                    backends: snapshot.unhealthy(),
                }),
            }
        }
    }
}

/// Collects monitors before anything is started.
pub struct SupervisorBuilder {
    monitors: Vec<(Box<dyn Supervised>, bool)>,
    poll_interval: Duration,
}

impl SupervisorBuilder {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            monitors: Vec::new(),
            poll_interval,
        }
    }

    /// Register a monitor. Required monitors must connect before `start` returns.
    pub fn supervise<C: Connector>(mut self, monitor: ConnectionMonitor<C>, required_at_startup: bool) -> Self {
        self.monitors.push((Box::new(monitor), required_at_startup));
        self
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Connect required backends, then spawn every loop.
    ///
    /// On a startup failure every monitor already connected is closed.
    pub async fn start(self, shutdown: &Shutdown) -> Result<Supervisor, SupervisorError> {
        let mut monitors = self.monitors;

        for i in 0..monitors.len() {
            let (monitor, required) = &mut monitors[i];
            if !*required {
                continue;
            }
            tracing::info!(backend = %monitor.name(), "Connecting required backend");
            if let Err(e) = monitor.connect().await {
                for (opened, _) in monitors[..i].iter_mut() {
                    opened.disconnect().await;
                }
                return Err(SupervisorError::Startup(e));
            }
        }

        let sources = monitors
            .iter()
            .map(|(monitor, _)| (monitor.name().to_string(), monitor.state()))
            .collect();
        let aggregator = Arc::new(HealthAggregator::new(sources, self.poll_interval));

        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
        let mut tasks = Vec::with_capacity(monitors.len() + 1);

        for (monitor, _) in monitors {
            let backend = monitor.name().to_string();
            let state = monitor.state();
            let fatal_tx = fatal_tx.clone();
            let inner = tokio::spawn(monitor.run(shutdown.subscribe()));

            tasks.push(tokio::spawn(async move {
                let error = match inner.await {
                    Ok(Ok(())) => return,
                    Ok(Err(e)) => e,
                    Err(e) => {
                        state.publish(ConnectionPhase::Failed);
                        MonitorError::Aborted {
                            backend,
                            message: e.to_string(),
                        }
                    }
                };
                tracing::error!(backend = %error.backend(), error = %error, "Backend supervision failed");
                let _ = fatal_tx.send(error);
            }));
        }

        tasks.push(tokio::spawn(aggregator.clone().run(shutdown.subscribe())));

        tracing::info!(backends = tasks.len() - 1, "Supervisor started");

        Ok(Supervisor {
            aggregator,
            fatal_rx: Mutex::new(fatal_rx),
            tasks: Mutex::new(tasks),
        })
    }
}

/// Running supervision; shared with the HTTP layer.
pub struct Supervisor {
    aggregator: Arc<HealthAggregator>,
    fatal_rx: Mutex<mpsc::UnboundedReceiver<MonitorError>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Supervisor {
    pub fn builder(poll_interval: Duration) -> SupervisorBuilder {
        SupervisorBuilder::new(poll_interval)
    }

    /// Probe answer from the latest snapshot; performs no I/O.
    pub fn status(&self) -> ProbeStatus {
        ProbeStatus::from_snapshot(&self.aggregator.snapshot())
    }

    pub fn snapshot(&self) -> Arc<AggregateHealth> {
        self.aggregator.snapshot()
    }

    /// Wait for the first fatal monitor error.
    ///
    /// Returns `None` once every monitor has stopped without one.
    pub async fn fatal(&self) -> Option<MonitorError> {
        self.fatal_rx.lock().await.recv().await
    }

    /// Wait for every background task to finish.
    pub async fn join(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Supervision task panicked");
            }
        }
    }
}
