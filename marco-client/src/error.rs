//! Error types for the sync client.

use marco_crypto::CryptoError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`SyncClient`](crate::SyncClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// An operation needs a key but `set_credentials` has not been called.
    #[error("sync credentials are not configured")]
    MissingCredentials,

    /// Transport failure.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL response carried errors.
    #[error("graphql error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// Key derivation or envelope encryption failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
