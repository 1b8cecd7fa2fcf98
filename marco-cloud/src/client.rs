//! The adapter contract shared by every provider.

use crate::error::{CloudError, CloudResult};
use async_trait::async_trait;
use marco_types::{ProviderToken, SnapshotRecord, SyncProvider};
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Moves one project's snapshot to and from a cloud drive.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// The provider this adapter talks to.
    fn provider(&self) -> SyncProvider;

    /// Uploads the record, overwriting the project's existing file.
    async fn push(&self, record: &SnapshotRecord, token: &ProviderToken) -> CloudResult<()>;

    /// Downloads the project's file, or `None` if there is none.
    async fn pull(
        &self,
        project_id: &str,
        token: &ProviderToken,
    ) -> CloudResult<Option<SnapshotRecord>>;
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("failed to create HTTP client")
}

/// Passes 2xx responses through and turns anything else into
/// [`CloudError::Api`].
pub(crate) async fn ensure_success(
    response: Response,
    provider: SyncProvider,
    operation: &'static str,
) -> CloudResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CloudError::Api {
        provider,
        operation,
        status: status.as_u16(),
        body,
    })
}

/// Parses a JSON response body, reporting malformed bodies as
/// [`CloudError::InvalidResponse`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> CloudResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CloudError::InvalidResponse(format!("failed to parse {what}: {e}")))
}
