//! Error types for the snapshot service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use marco_types::SyncProvider;
use serde_json::json;
use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the snapshot service and its HTTP API.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body or a field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The provider path segment or argument is not a known provider.
    #[error("unknown sync provider: {0}")]
    UnknownProvider(String),

    /// No cached snapshot and the provider has none either.
    #[error("snapshot not found for {provider}/{project_id}")]
    NotFound {
        provider: SyncProvider,
        project_id: String,
    },

    /// No token is registered for the provider.
    #[error("no credentials registered for provider {0}")]
    MissingCredentials(SyncProvider),

    /// The request body exceeds the configured limit.
    #[error("request body too large")]
    PayloadTooLarge,

    /// Internal error (should not occur in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Invalid input / unknown provider: 400 Bad Request
    /// - Missing credentials: 401 Unauthorized
    /// - Not found: 404 Not Found
    /// - Payload too large: 413 Payload Too Large
    /// - Internal: 500 Internal Server Error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::UnknownProvider(_) => StatusCode::BAD_REQUEST,
            Self::MissingCredentials(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
