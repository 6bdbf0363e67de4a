//! edge-guard
//!
//! Admission gate and health probes in front of a minimal downstream.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ /health, /health/ready, /health/live ──▶ HealthChecker
//!                     │                                         ├─ ReadinessFlag
//!                     │                                         └─ HttpUpstreamProbe
//!                     ▼
//!                 RequestPipeline
//!                 rate_limit → cors → security_headers → preflight
//!                     │
//!                     ▼
//!                 downstream (GET /, JSON 404)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use edge_guard::config::load_config;
use edge_guard::health::{ReadinessFlag, ServerStartTime};
use edge_guard::http::{default_downstream, HttpServer};
use edge_guard::lifecycle::{
    bind_listener, build_health_checker, run_until_signal, wait_for_signal, Shutdown,
};
use edge_guard::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "edge-guard")]
#[command(about = "Request admission and health probes for HTTP services", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started = ServerStartTime::now();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_rpm = config.security.rate_limit_rpm,
        cors_origins = ?config.security.cors_origins,
        security_headers = config.security.enable_headers,
        health_enabled = config.health.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let readiness = Arc::new(ReadinessFlag::new(false));
    let checker = build_health_checker(&config, started, readiness.clone())?;
    let server = HttpServer::new(&config, Arc::new(checker), default_downstream());

    let listener = bind_listener(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let serve = tokio::spawn(server.run(listener, shutdown.subscribe()));

    // Nothing to warm up in the bundled downstream.
    readiness.mark_ready();

    run_until_signal(serve, wait_for_signal(), &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
