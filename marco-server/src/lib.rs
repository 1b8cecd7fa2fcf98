//! Remote snapshot service for Marco.
//!
//! Caches the latest encrypted snapshot per `(provider, project)`, mirrors
//! every push to the provider's drive and pulls from it on a cold cache.
//! Served over REST (`/api`) and GraphQL (`/graphql`).

pub mod api;
mod config;
mod error;
mod service;
mod store;
pub mod validation;

pub use config::{ServerConfig, DEFAULT_BODY_LIMIT, DEFAULT_PORT};
pub use error::{ServiceError, ServiceResult};
pub use service::SnapshotService;
pub use store::SnapshotStore;

use async_graphql_axum::GraphQL;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post_service};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Build the HTTP router over the given service.
pub fn build_router(service: Arc<SnapshotService>, config: &ServerConfig) -> Router {
    let schema = api::build_schema(service.clone());
    let graphql = if config.graphiql {
        get(api::graphql::graphiql).post_service(GraphQL::new(schema))
    } else {
        post_service(GraphQL::new(schema))
    };

    Router::new()
        .nest("/api", api::rest::routes())
        .route("/graphql", graphql)
        .with_state(service)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(CorsLayer::permissive())
}

/// Installs the global log subscriber for the binaries.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
/// Logs go to stderr so stdout stays free for command output.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
