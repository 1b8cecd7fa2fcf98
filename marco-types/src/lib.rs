//! Core type definitions for Marco snapshot sync.
//!
//! This crate defines the data model shared by the local and remote halves
//! of the sync subsystem:
//! - Cloud providers a snapshot can be mirrored to
//! - The encrypted snapshot envelope (opaque to servers and adapters)
//! - Snapshot records, metadata and push input
//! - Provider bearer tokens
//! - Millisecond wall-clock helpers
//!
//! Nothing here performs I/O.

mod ids;
mod provider;
mod snapshot;
mod timestamp;

pub use ids::SnapshotId;
pub use provider::SyncProvider;
pub use snapshot::{ProviderToken, SnapshotEnvelope, SnapshotInput, SnapshotMeta, SnapshotRecord};
pub use timestamp::{millis_to_rfc3339, now_millis, parse_rfc3339_millis};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown sync provider: {0}")]
    InvalidProvider(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
