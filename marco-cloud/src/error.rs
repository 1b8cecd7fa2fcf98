//! Error types for the provider adapters.

use marco_types::SyncProvider;
use thiserror::Error;

/// Result type for provider operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can occur talking to a cloud provider.
#[derive(Debug, Error)]
pub enum CloudError {
    /// Transport failure before a response arrived.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("{provider} {operation} failed ({status}): {body}")]
    Api {
        provider: SyncProvider,
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// No token is registered for the provider.
    #[error("no token registered for provider {0}")]
    MissingToken(SyncProvider),

    /// No adapter is registered for the provider.
    #[error("no adapter registered for provider {0}")]
    NoAdapter(SyncProvider),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The provider answered with something we cannot use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
