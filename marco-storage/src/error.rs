//! Error types for the storage layer.

use crate::backup::{CollectionFailure, ImportSummary};
use crate::schema::Collection;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The collection has no secondary index with this name.
    #[error("collection {collection} has no index named {index}")]
    UnknownIndex {
        collection: Collection,
        index: String,
    },

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// An import stopped short in one or more collections. Whatever was
    /// written before the failure stays written.
    #[error("import partially applied; {} collection(s) failed", .failures.len())]
    PartialImport {
        summary: ImportSummary,
        failures: Vec<CollectionFailure>,
    },
}
