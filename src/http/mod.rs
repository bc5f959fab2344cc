//! HTTP probe interface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, timeout)
//!     → handlers.rs (/live, /read, /, fallback)
//!     → Supervisor::status() (snapshot read, no I/O)
//!     → JSON response
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
