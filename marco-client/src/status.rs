//! Observable sync status.

use marco_types::SyncProvider;
use serde::{Deserialize, Serialize};

/// Coarse state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// No credentials yet.
    Disabled,
    /// Credentials set, nothing transferred yet.
    Standby,
    /// Last transfer succeeded.
    Active,
    /// A transfer is running.
    Updating,
    /// Last transfer failed.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub mode: SyncMode,
    /// Human-readable description of the state.
    pub detail: String,
    pub last_provider: Option<SyncProvider>,
    pub last_synced_at: Option<i64>,
    pub last_error: Option<String>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            mode: SyncMode::Disabled,
            detail: "Set credentials to start syncing.".to_string(),
            last_provider: None,
            last_synced_at: None,
            last_error: None,
        }
    }
}
