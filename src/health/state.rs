//! Published connection state of a single monitor.
//!
//! # States
//! ```text
//! Disconnected → Connecting → Connected
//! Connected → Reconnecting: consecutive heartbeat failures >= threshold
//! Reconnecting → Connected: connect succeeded
//! Reconnecting / Connecting → Failed: retry budget exhausted (terminal)
//! ```
//!
//! Only the owning monitor writes; any number of readers may poll.

use std::sync::atomic::{AtomicU8, Ordering};

/// Connection phase.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Reconnecting = 3,
    Failed = 4,
}

impl From<u8> for ConnectionPhase {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionPhase::Connecting,
            2 => ConnectionPhase::Connected,
            3 => ConnectionPhase::Reconnecting,
            4 => ConnectionPhase::Failed,
            _ => ConnectionPhase::Disconnected,
        }
    }
}

/// Single-writer, multi-reader connection state.
#[derive(Debug)]
pub struct ConnectionState {
    phase: AtomicU8,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(ConnectionPhase::Disconnected as u8),
        }
    }

    /// True only while the last completed connect or heartbeat succeeded.
    pub fn is_connected(&self) -> bool {
        self.phase() == ConnectionPhase::Connected
    }

    pub fn phase(&self) -> ConnectionPhase {
        ConnectionPhase::from(self.phase.load(Ordering::Acquire))
    }

    /// Publish a new phase, returning the previous one.
    pub(crate) fn publish(&self, phase: ConnectionPhase) -> ConnectionPhase {
        ConnectionPhase::from(self.phase.swap(phase as u8, Ordering::AcqRel))
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
