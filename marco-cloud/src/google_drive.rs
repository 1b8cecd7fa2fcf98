//! Google Drive adapter.
//!
//! Uses Drive API v3. Each project's snapshot is one file named
//! [`GoogleDriveConfig::file_name`] in the hidden `appDataFolder` space,
//! told apart by a `projectId` app property.

use crate::client::{ensure_success, http_client, read_json, ProviderClient};
use crate::error::CloudResult;
use async_trait::async_trait;
use marco_types::{
    now_millis, ProviderToken, SnapshotEnvelope, SnapshotId, SnapshotMeta, SnapshotRecord,
    SyncProvider,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

const APP_DATA_FOLDER: &str = "appDataFolder";
const FILE_FIELDS: &str = "files(id,name,modifiedTime,appProperties,size)";

/// Google Drive specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleDriveConfig {
    /// Base URL for Google Drive API (e.g. `https://www.googleapis.com`).
    pub api_base_url: String,
    /// Base URL for media uploads (e.g. `https://www.googleapis.com/upload`).
    pub upload_base_url: String,
    /// Name of the snapshot file inside `appDataFolder`.
    pub file_name: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleDriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com".to_string(),
            upload_base_url: "https://www.googleapis.com/upload".to_string(),
            file_name: "ac-backup.json.enc".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Google Drive API response structures.
#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(default)]
    app_properties: HashMap<String, String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

/// Drive `appDataFolder` adapter.
pub struct GoogleDriveClient {
    config: GoogleDriveConfig,
    client: Client,
}

impl GoogleDriveClient {
    pub fn new(config: GoogleDriveConfig) -> Self {
        let client = http_client(config.timeout_secs);
        Self { config, client }
    }

    pub fn config(&self) -> &GoogleDriveConfig {
        &self.config
    }

    async fn find_file(
        &self,
        project_id: &str,
        token: &ProviderToken,
    ) -> CloudResult<Option<DriveFile>> {
        let query = format!(
            "name='{}' and trashed=false and appProperties has {{ key='projectId' and value='{}' }}",
            escape_query(&self.config.file_name),
            escape_query(project_id)
        );
        debug!("Locating Drive snapshot for project {}", project_id);

        let response = self
            .client
            .get(format!("{}/drive/v3/files", self.config.api_base_url))
            .bearer_auth(&token.access_token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", APP_DATA_FOLDER),
                ("fields", FILE_FIELDS),
            ])
            .send()
            .await?;
        let response = ensure_success(response, SyncProvider::Google, "file search").await?;
        let list: DriveFileList = read_json(response, "file list").await?;
        Ok(list.files.into_iter().next())
    }

    /// Builds a `multipart/related` body: JSON metadata, then the envelope.
    fn multipart_body(
        &self,
        record: &SnapshotRecord,
        is_update: bool,
    ) -> CloudResult<(String, String)> {
        let boundary = format!("-------marco_sync_{:x}", now_millis());

        let mut metadata = serde_json::json!({
            "name": self.config.file_name,
            "appProperties": {
                "projectId": record.meta.project_id,
                "deviceId": record.meta.device_id,
                "hash": record.meta.hash,
                "updatedAt": record.meta.updated_at.to_string(),
            },
        });
        // Drive rejects `parents` on update.
        if !is_update {
            metadata["parents"] = serde_json::json!([APP_DATA_FOLDER]);
        }

        let body = format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n\
             --{boundary}\r\nContent-Type: application/json\r\n\r\n{}\r\n\
             --{boundary}--",
            serde_json::to_string(&metadata)?,
            serde_json::to_string(&record.payload)?,
        );
        Ok((body, boundary))
    }
}

impl Default for GoogleDriveClient {
    fn default() -> Self {
        Self::new(GoogleDriveConfig::default())
    }
}

#[async_trait]
impl ProviderClient for GoogleDriveClient {
    fn provider(&self) -> SyncProvider {
        SyncProvider::Google
    }

    async fn push(&self, record: &SnapshotRecord, token: &ProviderToken) -> CloudResult<()> {
        let existing = self.find_file(&record.meta.project_id, token).await?;
        let (body, boundary) = self.multipart_body(record, existing.is_some())?;

        let request = match &existing {
            Some(file) => self.client.patch(format!(
                "{}/drive/v3/files/{}",
                self.config.upload_base_url,
                urlencoding::encode(&file.id)
            )),
            None => self
                .client
                .post(format!("{}/drive/v3/files", self.config.upload_base_url)),
        };

        debug!(
            "Uploading Drive snapshot for project {} ({})",
            record.meta.project_id,
            if existing.is_some() { "update" } else { "create" }
        );
        let response = request
            .bearer_auth(&token.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let response = ensure_success(response, SyncProvider::Google, "upload").await?;
        let uploaded: UploadedFile = read_json(response, "upload response").await?;

        info!(
            "Uploaded Drive snapshot for project {}: file {}",
            record.meta.project_id, uploaded.id
        );
        Ok(())
    }

    async fn pull(
        &self,
        project_id: &str,
        token: &ProviderToken,
    ) -> CloudResult<Option<SnapshotRecord>> {
        let Some(file) = self.find_file(project_id, token).await? else {
            debug!("No Drive snapshot for project {}", project_id);
            return Ok(None);
        };

        debug!("Downloading Drive file {} for project {}", file.id, project_id);
        let response = self
            .client
            .get(format!(
                "{}/drive/v3/files/{}",
                self.config.api_base_url,
                urlencoding::encode(&file.id)
            ))
            .bearer_auth(&token.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let response = ensure_success(response, SyncProvider::Google, "download").await?;
        let payload: SnapshotEnvelope = read_json(response, "snapshot envelope").await?;

        let props = &file.app_properties;
        let now = now_millis();
        let meta = SnapshotMeta {
            provider: SyncProvider::Google,
            project_id: project_id.to_string(),
            device_id: props
                .get("deviceId")
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            hash: props.get("hash").cloned().unwrap_or_default(),
            updated_at: props
                .get("updatedAt")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(now as f64),
            size: file
                .size
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(payload.ciphertext.len() as u64),
        };

        Ok(Some(SnapshotRecord {
            id: SnapshotId::from(file.id),
            payload,
            meta,
            created_at: now,
            updated_at: now,
        }))
    }
}

/// Escapes a string literal for a Drive `q` expression.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
