//! Combined health verdict.
//!
//! # Responsibilities
//! - Poll every tracked monitor's state on a fixed interval
//! - Republish a snapshot only when some backend changed
//! - Serve the latest snapshot without blocking
//!
//! The published view may lag a monitor by up to one poll interval.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::health::state::ConnectionState;

/// Per-backend health and their conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateHealth {
    per_backend: BTreeMap<String, bool>,
    combined: bool,
}

impl AggregateHealth {
    pub fn new(per_backend: BTreeMap<String, bool>) -> Self {
        let combined = per_backend.values().all(|healthy| *healthy);
        Self {
            per_backend,
            combined,
        }
    }

    /// True iff every backend is healthy; vacuously true with none.
    pub fn combined(&self) -> bool {
        self.combined
    }

    pub fn per_backend(&self) -> &BTreeMap<String, bool> {
        &self.per_backend
    }

    /// Names of unhealthy backends, sorted.
    pub fn unhealthy(&self) -> Vec<String> {
        self.per_backend
            .iter()
            .filter(|(_, healthy)| !**healthy)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Polls monitors and publishes `AggregateHealth`.
pub struct HealthAggregator {
    sources: Vec<(String, Arc<ConnectionState>)>,
    snapshot: ArcSwap<AggregateHealth>,
    poll_interval: Duration,
}

impl HealthAggregator {
    pub fn new(sources: Vec<(String, Arc<ConnectionState>)>, poll_interval: Duration) -> Self {
        let aggregator = Self {
            sources,
            snapshot: ArcSwap::from_pointee(AggregateHealth::new(BTreeMap::new())),
            poll_interval,
        };
        aggregator.snapshot.store(Arc::new(aggregator.poll()));
        aggregator
    }

    /// Latest published verdict. Never blocks, never does I/O.
    pub fn snapshot(&self) -> Arc<AggregateHealth> {
        self.snapshot.load_full()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn poll(&self) -> AggregateHealth {
        AggregateHealth::new(
            self.sources
                .iter()
                .map(|(name, state)| (name.clone(), state.is_connected()))
                .collect(),
        )
    }

    /// Poll once; returns true if a new snapshot was published.
    pub(crate) fn refresh(&self) -> bool {
        let current = self.snapshot.load();
        let next = self.poll();
        if next == **current {
            return false;
        }

        for (name, healthy) in next.per_backend() {
            if current.per_backend().get(name) != Some(healthy) {
                tracing::info!(backend = %name, connected = *healthy, "Backend connection status changed");
            }
        }
        if next.combined() != current.combined() {
            if next.combined() {
                tracing::info!("All backends healthy");
            } else {
                tracing::warn!(unhealthy = ?next.unhealthy(), "Service degraded");
            }
        }

        self.snapshot.store(Arc::new(next));
        true
    }

    /// Poll loop; the only writer of the snapshot.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            backends = self.sources.len(),
            interval = ?self.poll_interval,
            "Health aggregator starting"
        );

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health aggregator received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
