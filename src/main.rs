//! liveprobe: liveness/readiness sidecar.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                    LIVEPROBE                      │
//!                    │                                                   │
//!   GET /live        │  ┌─────────┐    ┌────────────┐    ┌───────────┐  │
//!   GET /read ───────┼─▶│  http   │───▶│ supervisor │───▶│ aggregate │  │
//!                    │  │ server  │    │  status()  │    │ snapshot  │  │
//!                    │  └─────────┘    └────────────┘    └─────▲─────┘  │
//!                    │                                         │ poll    │
//!                    │          ┌──────────────┬──────────────┼───────┐ │
//!                    │          │              │              │       │ │
//!                    │   ┌──────┴─────┐ ┌──────┴─────┐ ┌──────┴─────┐ │ │
//!                    │   │  monitor   │ │  monitor   │ │  monitor   │ │ │
//!                    │   │ websocket  │ │   cache    │ │  brokers   │ │ │
//!                    │   └──────┬─────┘ └──────┬─────┘ └──────┬─────┘ │ │
//!                    └──────────┼──────────────┼──────────────┼───────┘─┘
//!                               ▼              ▼              ▼
//!                          ws:// feed     redis://       host:port
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use liveprobe::config::load_config;
use liveprobe::lifecycle::{drain, shutdown_signal, start_supervisor};
use liveprobe::observability::{init_logging, init_metrics};
use liveprobe::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "liveprobe", version, about = "Liveness/readiness probe for backend connections")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "liveprobe.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    if cli.check {
        println!("{}: configuration OK", cli.config.display());
        return Ok(());
    }

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "liveprobe starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_retry = config.retry.max_retry,
        max_wait_secs = config.retry.max_wait_secs,
        websocket = config.websocket.is_some(),
        cache = config.cache.is_some(),
        brokers = config.brokers.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let supervision = Shutdown::new();
    let server_shutdown = Shutdown::new();

    // Required backends are connected before the listener is bound.
    let supervisor = Arc::new(start_supervisor(&config, &supervision).await?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for probes");

    let server = HttpServer::new(&config, supervisor.clone());
    let server_task = tokio::spawn(server.run(listener, server_shutdown.wait()));

    let fatal = tokio::select! {
        signal = shutdown_signal() => {
            tracing::info!(signal, "Shutdown signal received");
            None
        }
        error = async {
            match supervisor.fatal().await {
                Some(e) => e,
                None => std::future::pending().await,
            }
        } => Some(error),
    };

    let grace = config.lifecycle.shutdown_grace();
    let server = async {
        match server_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
            Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
        }
    };

    if !drain(&server_shutdown, server, &supervision, &supervisor, grace).await {
        tracing::warn!(grace = ?grace, "Shutdown grace period elapsed, exiting");
    }

    if let Some(e) = fatal {
        tracing::error!(backend = %e.backend(), error = %e, "Exiting after unrecoverable backend failure");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
