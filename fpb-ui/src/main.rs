//! fpb-ui - Family Photo Browser web service entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fpb_common::config::Config;
use fpb_common::fetch::GcsFetcher;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fpb_ui::{build_router, warm_up, AppState};

/// Command-line arguments for fpb-ui
#[derive(Parser, Debug)]
#[command(name = "fpb-ui")]
#[command(about = "Family Photo Browser web service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5760", env = "FPB_UI_PORT")]
    port: u16,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "FPB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fpb_ui=info,fpb_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting FPB UI v{}", env!("CARGO_PKG_VERSION"));

    let config =
        Config::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    info!(
        bucket = %config.bucket,
        sources = config.sources.len(),
        global_queries = config.global_queries.len(),
        "Configuration loaded"
    );

    let fetcher =
        GcsFetcher::new(&config.base_url, &config.bucket).context("Failed to build storage client")?;
    let state = AppState::new(config, Arc::new(fetcher));

    // Warm the table cache so the first query does not pay the fetch cost
    warm_up(&state).await;

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("fpb-ui listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
