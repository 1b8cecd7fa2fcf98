//! Snapshot records and the encrypted envelope they carry.

use crate::ids::SnapshotId;
use crate::provider::SyncProvider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-side encrypted blob.
///
/// The server and provider adapters never decrypt or interpret it; the
/// fields are base64url strings produced by the client plus the key
/// derivation parameters needed to reopen it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub iterations: u32,
}

impl SnapshotEnvelope {
    /// Size accounted for a stored envelope: encoded ciphertext plus encoded iv.
    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        (self.ciphertext.len() + self.iv.len()) as u64
    }
}

/// Metadata describing a stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub provider: SyncProvider,
    pub project_id: String,
    pub device_id: String,
    pub hash: String,
    /// Client-asserted time of the last change to this copy (epoch millis).
    ///
    /// Kept as sent, fractions included: it is the only signal for which
    /// copy is newer.
    pub updated_at: f64,
    pub size: u64,
}

/// The latest snapshot for one `(provider, project_id)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub id: SnapshotId,
    pub payload: SnapshotEnvelope,
    pub meta: SnapshotMeta,
    /// Server receipt time of the first upsert (epoch millis).
    pub created_at: i64,
    /// Server receipt time of the latest upsert (epoch millis).
    pub updated_at: i64,
}

impl SnapshotRecord {
    /// Key under which the record is cached.
    #[must_use]
    pub fn key(&self) -> (SyncProvider, &str) {
        (self.meta.provider, self.meta.project_id.as_str())
    }
}

/// A snapshot push as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInput {
    pub provider: SyncProvider,
    pub project_id: String,
    pub device_id: String,
    pub hash: String,
    /// Epoch millis; any finite number.
    pub updated_at: f64,
    pub payload: SnapshotEnvelope,
}

impl From<&SnapshotRecord> for SnapshotInput {
    fn from(record: &SnapshotRecord) -> Self {
        Self {
            provider: record.meta.provider,
            project_id: record.meta.project_id.clone(),
            device_id: record.meta.device_id.clone(),
            hash: record.meta.hash.clone(),
            updated_at: record.meta.updated_at,
            payload: record.payload.clone(),
        }
    }
}

/// Bearer credentials for a provider. Held in memory only.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry in epoch millis, if the issuer reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl ProviderToken {
    /// Creates a token with only an access token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Returns true if the token carries an expiry at or before `now_millis`.
    #[must_use]
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_millis)
    }
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderToken")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
