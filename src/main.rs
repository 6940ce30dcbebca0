//! Route registry host.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                  ROUTE REGISTRY                   │
//!                         │                                                   │
//!     Client Request      │  ┌─────────┐    ┌────────────┐    ┌────────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│  routing   │───▶│  handler   │  │
//!                         │  │ server  │    │ RouteTable │    │ (module)   │  │
//!                         │  └─────────┘    └─────┬──────┘    └────────────┘  │
//!                         │                       │ legacy path               │
//!                         │                       ▼                           │
//!                         │                ┌────────────┐   ┌─────────────┐   │
//!                         │                │   compat   │──▶│  telemetry  │   │
//!                         │                │  shadows   │   │  counters   │   │
//!                         │                └─────┬──────┘   └─────────────┘   │
//!                         │                      │ rewrite + dispatch         │
//!                         │                      ▼                            │
//!                         │                 canonical route                   │
//!                         │                                                   │
//!                         │  ┌─────────────────────────────────────────────┐  │
//!                         │  │ registry (bootstrap, conflicts, discovery)  │  │
//!                         │  │ config · observability · lifecycle          │  │
//!                         │  └─────────────────────────────────────────────┘  │
//!                         └───────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `route-registry [config.toml]` (or `ROUTE_REGISTRY_CONFIG`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use route_registry::config::{load_config, RegistryConfig};
use route_registry::lifecycle::{spawn_flusher, spawn_signal_listener, Shutdown};
use route_registry::observability::{logging, metrics};
use route_registry::{App, HttpServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ROUTE_REGISTRY_CONFIG").ok())
        .map(PathBuf::from);

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("route-registry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = %config_path.as_ref().map_or("<defaults>".to_string(), |p| p.display().to_string()),
        bind_address = %config.listener.bind_address,
        canonical = %config.namespace.canonical,
        compat_enabled = config.compat.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let flush_interval = Duration::from_secs(config.telemetry.flush_interval_secs);
    let bind_address = config.listener.bind_address.clone();
    let app = App::builder(config).build();

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(Arc::clone(&shutdown));
    let flusher = spawn_flusher(
        Arc::clone(app.telemetry()),
        flush_interval,
        shutdown.subscribe(),
    );

    let listener = TcpListener::bind(&bind_address).await?;
    let server = HttpServer::new(&app);
    let served = server.run(listener, shutdown.subscribe()).await;

    // Stop the flusher even when the server failed; it flushes once more on the way out.
    shutdown.trigger();
    flusher.await?;

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
