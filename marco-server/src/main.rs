//! Marco snapshot service
//!
//! Serves the REST and GraphQL snapshot API and mirrors pushed snapshots
//! to Google Drive and OneDrive.
//!
//! Usage:
//!   marco-server --port 3333
//!
//! Snapshots are cached in memory only; provider drives hold the durable copy.

use anyhow::{Context, Result};
use clap::Parser;
use marco_cloud::ProviderRegistry;
use marco_server::{build_router, init_tracing, ServerConfig, SnapshotService, DEFAULT_BODY_LIMIT};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "marco-server")]
#[command(about = "Marco snapshot sync service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = marco_server::DEFAULT_PORT)]
    port: u16,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,

    /// Do not serve the GraphiQL page on GET /graphql
    #[arg(long)]
    no_graphiql: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ServerConfig {
        port: args.port,
        body_limit_bytes: args.body_limit,
        graphiql: !args.no_graphiql,
    };

    let service = Arc::new(SnapshotService::new(ProviderRegistry::with_defaults()));
    let app = build_router(service, &config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    info!("Snapshot API listening on http://0.0.0.0:{}", config.port);
    info!("REST endpoint: /api, GraphQL endpoint: /graphql");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Snapshot API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
