//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Build monitors → Connect required backends → Spawn loops
//!
//! Shutdown (shutdown.rs):
//!     Server drains → Monitors close handles → Aggregator stops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Listener binds only after required backends are up
//! - Shutdown has a deadline: forced exit after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{drain, Shutdown};
pub use signals::shutdown_signal;
pub use startup::start_supervisor;
