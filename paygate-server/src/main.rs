//! Payment gate HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p paygate-server --release
//!
//! # Run with custom config path
//! paygate-server --config /path/to/config.toml
//!
//! # Configure logging level
//! RUST_LOG=debug paygate-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `3402`)
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderName, Method};
use clap::Parser;
use paygate_http::constants::{PAYMENT_ID_HEADER, PAYMENT_PROOF_HEADER, PAYMENT_VERIFIED_HEADER};
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paygate_server::shutdown::Shutdown;
use paygate_server::{AppState, ServerConfig, router};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load_from(&cli.config)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        networks = config.networks.len(),
        routes = config.routes.len(),
        ttl_minutes = config.ttl_minutes,
        "Loaded configuration"
    );
    if config.networks.is_empty() {
        tracing::warn!("No networks configured; every payment request will be refused");
    }

    let state = AppState::from_config(&config)?;
    let shutdown = Shutdown::try_new()?;
    shutdown.spawn(Arc::clone(&state.store).run_sweeper(config.sweep_interval(), shutdown.token()));

    let app = router(state, &config.routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([
                    HeaderName::from_static(PAYMENT_ID_HEADER),
                    HeaderName::from_static(PAYMENT_PROOF_HEADER),
                    axum::http::header::CONTENT_TYPE,
                ])
                .expose_headers([HeaderName::from_static(PAYMENT_VERIFIED_HEADER)]),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Payment gate listening on http://{addr}");

    let token = shutdown.token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    shutdown.finish().await;
    tracing::info!("Payment gate shut down gracefully");
    Ok(())
}
