//! OneDrive adapter.
//!
//! Uses Microsoft Graph v1.0. Each project's snapshot is the file
//! `{project_id}-{file_name}` in the application's approot folder, holding
//! the envelope together with its metadata.

use crate::client::{ensure_success, http_client, read_json, ProviderClient};
use crate::error::CloudResult;
use async_trait::async_trait;
use marco_types::{
    now_millis, parse_rfc3339_millis, ProviderToken, SnapshotEnvelope, SnapshotId,
    SnapshotMeta, SnapshotRecord, SyncProvider,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// OneDrive specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneDriveConfig {
    /// Base URL for Microsoft Graph (e.g. `https://graph.microsoft.com/v1.0`).
    pub api_base_url: String,
    /// Suffix appended to the project id to form the file name.
    pub file_name: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OneDriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            file_name: "ac-backup.json.enc".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveItemList {
    #[serde(default)]
    value: Vec<DriveItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: String,
    size: Option<u64>,
    last_modified_date_time: Option<String>,
}

/// File content: the envelope plus the metadata it was pushed with.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    payload: SnapshotEnvelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<SnapshotMeta>,
}

/// OneDrive approot adapter.
pub struct OneDriveClient {
    config: OneDriveConfig,
    client: Client,
}

impl OneDriveClient {
    pub fn new(config: OneDriveConfig) -> Self {
        let client = http_client(config.timeout_secs);
        Self { config, client }
    }

    pub fn config(&self) -> &OneDriveConfig {
        &self.config
    }

    /// File name used for a project.
    pub fn file_name_for(&self, project_id: &str) -> String {
        format!("{}-{}", project_id, self.config.file_name)
    }

    async fn find_item(
        &self,
        project_id: &str,
        token: &ProviderToken,
    ) -> CloudResult<Option<DriveItem>> {
        let name = self.file_name_for(project_id);
        let filter = format!("name eq '{}'", name.replace('\'', "''"));
        debug!("Locating OneDrive snapshot {}", name);

        let response = self
            .client
            .get(format!(
                "{}/me/drive/special/approot/children",
                self.config.api_base_url
            ))
            .bearer_auth(&token.access_token)
            .query(&[
                ("$filter", filter.as_str()),
                ("$select", "id,name,size,lastModifiedDateTime"),
            ])
            .send()
            .await?;

        // The app folder does not exist until the first upload.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, SyncProvider::Microsoft, "file search").await?;
        let list: DriveItemList = read_json(response, "item list").await?;
        Ok(list.value.into_iter().next())
    }
}

impl Default for OneDriveClient {
    fn default() -> Self {
        Self::new(OneDriveConfig::default())
    }
}

#[async_trait]
impl ProviderClient for OneDriveClient {
    fn provider(&self) -> SyncProvider {
        SyncProvider::Microsoft
    }

    async fn push(&self, record: &SnapshotRecord, token: &ProviderToken) -> CloudResult<()> {
        let name = self.file_name_for(&record.meta.project_id);
        let body = serde_json::to_vec(&StoredSnapshot {
            payload: record.payload.clone(),
            meta: Some(record.meta.clone()),
        })?;

        let existing = self.find_item(&record.meta.project_id, token).await?;
        let url = match &existing {
            Some(item) => format!(
                "{}/me/drive/items/{}/content",
                self.config.api_base_url,
                urlencoding::encode(&item.id)
            ),
            None => format!(
                "{}/me/drive/special/approot:/{}:/content",
                self.config.api_base_url,
                urlencoding::encode(&name)
            ),
        };

        debug!("Uploading OneDrive snapshot {}", name);
        let response = self
            .client
            .put(url)
            .bearer_auth(&token.access_token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let response = ensure_success(response, SyncProvider::Microsoft, "upload").await?;
        let item: DriveItem = read_json(response, "upload response").await?;

        info!("Uploaded OneDrive snapshot {}: item {}", name, item.id);
        Ok(())
    }

    async fn pull(
        &self,
        project_id: &str,
        token: &ProviderToken,
    ) -> CloudResult<Option<SnapshotRecord>> {
        let Some(item) = self.find_item(project_id, token).await? else {
            debug!("No OneDrive snapshot for project {}", project_id);
            return Ok(None);
        };

        debug!("Downloading OneDrive item {} for project {}", item.id, project_id);
        let response = self
            .client
            .get(format!(
                "{}/me/drive/items/{}/content",
                self.config.api_base_url,
                urlencoding::encode(&item.id)
            ))
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let response = ensure_success(response, SyncProvider::Microsoft, "download").await?;
        let stored: StoredSnapshot = read_json(response, "snapshot file").await?;

        let now = now_millis();
        let meta = match stored.meta {
            Some(meta) => meta,
            None => SnapshotMeta {
                provider: SyncProvider::Microsoft,
                project_id: project_id.to_string(),
                device_id: "unknown".to_string(),
                hash: String::new(),
                updated_at: item
                    .last_modified_date_time
                    .as_deref()
                    .and_then(|t| parse_rfc3339_millis(t).ok())
                    .unwrap_or(now) as f64,
                size: match item.size {
                    Some(size) => size,
                    None => serde_json::to_string(&stored.payload)?.len() as u64,
                },
            },
        };

        Ok(Some(SnapshotRecord {
            id: SnapshotId::from(item.id),
            payload: stored.payload,
            meta,
            created_at: now,
            updated_at: now,
        }))
    }
}
