//! Access log demo server.
//!
//! Serves a few sample routes behind the access log middleware and ships a
//! record for every request to the sink configured in the TOML file.
//!
//! ```text
//!  Client ──▶ TraceLayer ──▶ AccessLogLayer ──▶ handler
//!                                 │
//!                                 │ submit (non-blocking)
//!                                 ▼
//!                           ┌───────────┐    put_record    ┌──────────┐
//!                           │  worker   │ ───────────────▶ │   sink   │
//!                           └───────────┘                  └──────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use clap::Parser;
use remote_access_log::config::load_config;
use remote_access_log::observability::{logging, metrics};
use remote_access_log::AccessLog;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Parser)]
#[command(name = "access-log-demo")]
#[command(about = "Demo HTTP server with remote access logging", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Address to serve the demo routes on.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!(config = ?cli.config, "Configuration loaded");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let access_log = AccessLog::builder(config).build()?;

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/health", get(health))
        .route("/stream", get(stream))
        .route("/fail", get(fail))
        .layer(access_log.layer())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    access_log.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Multi-chunk text body; only the leading chunks end up in the record.
async fn stream() -> impl IntoResponse {
    let chunks = (0..50).map(|i| Ok::<_, std::io::Error>(Bytes::from(format!("line {i}\n"))));
    (
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from_stream(futures_util::stream::iter(chunks)),
    )
}

async fn fail() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong")
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
