//! Shutdown coordination for the probe.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{timeout, Instant};

use crate::health::Supervisor;

/// Coordinator for graceful shutdown.
///
/// Monitors and the aggregator share one instance; the HTTP server gets its
/// own so it can drain before supervision stops.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Future resolving once shutdown is triggered, even if that already happened.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        let triggered = self.triggered.clone();
        async move {
            if triggered.load(Ordering::Acquire) {
                return;
            }
            let _ = rx.recv().await;
        }
    }

    /// Number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop the HTTP server, then supervision, within one shared `grace` budget.
///
/// Backends stay supervised while in-flight probes drain, so those probes
/// see the live snapshot. Returns `false` if either stage ran out of time.
pub async fn drain<F>(
    server_shutdown: &Shutdown,
    server: F,
    supervision_shutdown: &Shutdown,
    supervisor: &Supervisor,
    grace: Duration,
) -> bool
where
    F: Future<Output = ()>,
{
    let started = Instant::now();

    server_shutdown.trigger();
    let server_drained = timeout(grace, server).await.is_ok();
    if !server_drained {
        tracing::warn!(grace = ?grace, "HTTP server did not drain within the grace period");
    }

    supervision_shutdown.trigger();
    let remaining = grace.saturating_sub(started.elapsed());
    let supervision_stopped = timeout(remaining, supervisor.join()).await.is_ok();
    if !supervision_stopped {
        tracing::warn!(grace = ?grace, "Supervision did not stop within the grace period");
    }

    server_drained && supervision_stopped
}
