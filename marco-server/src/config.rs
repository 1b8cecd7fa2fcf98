//! Server configuration.

use serde::{Deserialize, Serialize};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3333;

/// Default maximum request body size (5 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Runtime settings for the snapshot service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub body_limit_bytes: usize,
    /// Serve the GraphiQL page on `GET /graphql`.
    pub graphiql: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            graphiql: true,
        }
    }
}
