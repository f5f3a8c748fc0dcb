//! Movie service built on a declarative route tree.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup                                     per request
//!   ───────                                     ───────────
//!   Root / Movies / MovieRoutes producers       client
//!        │ resolve (validate, fail fast)          │
//!        ▼                                        ▼
//!   RouterDefinition tree                       server layers (request id, trace, timeout)
//!        │ apply                                  │
//!        ▼                                        ▼
//!   Engine (groups, handler chains) ──────────▶ axum::Router → handler chain → MovieStore
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use route_tree::config::{load_config, validate_config, AppConfig};
use route_tree::http::HttpServer;
use route_tree::lifecycle::{self, signals, Shutdown};
use route_tree::movies::MemMovieStore;
use route_tree::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "route-tree")]
#[command(about = "Movie service served from a declarative route tree", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("route-tree v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            tracing::error!(error = %e, "Invalid configuration");
        }
        std::process::exit(1);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
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

    let store = Arc::new(MemMovieStore::new());
    let app = match lifecycle::build_application(&config, store) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build routes");
            std::process::exit(1);
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config, app);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
