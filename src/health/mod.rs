//! Backend supervision subsystem.
//!
//! # Data Flow
//! ```text
//! Monitors (monitor.rs), one task per backend:
//!     Periodic timer
//!     → Heartbeat on the owned handle
//!     → Reconnect with backoff once tolerance is used up
//!     → Publish phase to state.rs
//!
//! Aggregator (aggregator.rs):
//!     Poll every state.rs on its own interval
//!     → Publish an immutable AggregateHealth snapshot
//!
//! Supervisor (supervisor.rs):
//!     Probe query → latest snapshot → ProbeStatus
//! ```
//!
//! # Design Decisions
//! - Each monitor is the single writer of its own state
//! - Probe queries never touch a backend
//! - Health is per-backend; the verdict is their conjunction

pub mod aggregator;
pub mod monitor;
pub mod state;
pub mod supervisor;

pub use aggregator::{AggregateHealth, HealthAggregator};
pub use monitor::{ConnectionMonitor, HeartbeatConfig, MonitorError, Supervised};
pub use state::{ConnectionPhase, ConnectionState};
pub use supervisor::{ProbeError, ProbeStatus, Supervisor, SupervisorBuilder, SupervisorError};
