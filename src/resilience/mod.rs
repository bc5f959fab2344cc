//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Heartbeat failure threshold reached:
//!     → backoff.rs (linear wait before each connect attempt)
//!     → budget exhausted → fatal, process exits
//! ```
//!
//! # Design Decisions
//! - Linear backoff, no jitter
//! - Every backend I/O call has a deadline, enforced by the monitor

pub mod backoff;

pub use backoff::BackoffPolicy;
