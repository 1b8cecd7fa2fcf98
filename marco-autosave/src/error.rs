//! Error types for the write queue.

use std::time::Duration;
use thiserror::Error;

/// Result type for write queue operations.
pub type AutoSaveResult<T> = Result<T, AutoSaveError>;

/// A flush attempt failed.
///
/// Callers of `queue` never see these; they surface from
/// [`AutoSaver::flush`](crate::AutoSaver::flush) and in the logs.
#[derive(Debug, Error)]
pub enum AutoSaveError {
    /// The batch was put back and another attempt is scheduled.
    #[error("flush attempt {attempt} failed, retrying in {delay:?}")]
    RetryScheduled {
        attempt: u32,
        delay: Duration,
        #[source]
        source: anyhow::Error,
    },

    /// Retries are exhausted and the pending operations were discarded.
    #[error("dropped {operations} operation(s) after {attempts} failed flush attempts")]
    Dropped {
        operations: usize,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}
