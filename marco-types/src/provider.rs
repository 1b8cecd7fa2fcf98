//! Cloud drive providers a snapshot can be mirrored to.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported cloud drive backend.
///
/// Serialized in lowercase (`"google"`, `"microsoft"`), which is also the
/// form used in REST paths and the GraphQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncProvider {
    /// Google Drive application data folder.
    Google,
    /// Microsoft OneDrive application folder.
    Microsoft,
}

impl SyncProvider {
    /// Every supported provider.
    pub const ALL: [SyncProvider; 2] = [SyncProvider::Google, SyncProvider::Microsoft];

    /// Returns the wire name of the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for SyncProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            other => Err(Error::InvalidProvider(other.to_string())),
        }
    }
}
