//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the probe handlers
//! - Wire up middleware (tracing, request timeout)
//! - Serve on a bound listener until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProbeConfig;
use crate::health::Supervisor;
use crate::http::handlers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<Supervisor>,
    pub app_name: Arc<str>,
}

/// HTTP server exposing `/live` and `/read`.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ProbeConfig, supervisor: Arc<Supervisor>) -> Self {
        let state = AppState {
            supervisor,
            app_name: Arc::from(config.app_name.as_str()),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProbeConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::welcome))
            .route("/live", get(handlers::live))
            .route("/read", get(handlers::read))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
