//! HTTP client for the snapshot service.

use crate::error::{ClientError, ClientResult};
use crate::options::{generate_device_id, SyncClientOptions, SyncCredentials};
use crate::status::{SyncMode, SyncStatus};
use marco_crypto::{content_hash, derive_key, open_string, seal_string, CryptoError, DerivedKey, KdfParams, Salt};
use marco_types::{now_millis, ProviderToken, SnapshotEnvelope, SnapshotMeta, SyncProvider};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Snapshot to push.
#[derive(Debug, Clone)]
pub struct PushSnapshot {
    pub provider: SyncProvider,
    pub project_id: String,
    /// Project data; a JSON string is sent as-is, anything else is serialized.
    pub payload: Value,
    /// Defaults to now.
    pub updated_at: Option<f64>,
}

/// One entry of [`SyncClient::list_snapshots`].
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub id: String,
    pub meta: SnapshotMeta,
}

struct KeyMaterial {
    key: DerivedKey,
    salt: Salt,
    iterations: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    provider: SyncProvider,
    project_id: &'a str,
    device_id: &'a str,
    hash: String,
    updated_at: f64,
    payload: SnapshotEnvelope,
}

#[derive(Deserialize)]
struct PushResponse {
    meta: SnapshotMeta,
}

#[derive(Deserialize)]
struct SnapshotResponse {
    payload: SnapshotEnvelope,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct SnapshotsData {
    snapshots: Vec<GqlSnapshot>,
}

#[derive(Deserialize)]
struct GqlSnapshot {
    id: String,
    meta: GqlMeta,
}

// GraphQL carries timestamps as Float.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlMeta {
    provider: SyncProvider,
    project_id: String,
    device_id: String,
    hash: String,
    updated_at: f64,
    size: u64,
}

impl From<GqlSnapshot> for SnapshotSummary {
    fn from(value: GqlSnapshot) -> Self {
        Self {
            id: value.id,
            meta: SnapshotMeta {
                provider: value.meta.provider,
                project_id: value.meta.project_id,
                device_id: value.meta.device_id,
                hash: value.meta.hash,
                updated_at: value.meta.updated_at,
                size: value.meta.size,
            },
        }
    }
}

const LIST_SNAPSHOTS: &str = r#"
query ListSnapshots($provider: SyncProvider) {
  snapshots(provider: $provider) {
    id
    meta { provider projectId hash updatedAt size deviceId }
  }
}
"#;

/// Encrypts project data on this device and exchanges it with the
/// snapshot service.
///
/// The service only ever sees envelopes; the key never leaves the client.
pub struct SyncClient {
    http: Client,
    api_base: String,
    graphql_url: String,
    device_id: String,
    default_iterations: u32,
    key: RwLock<Option<KeyMaterial>>,
    status: watch::Sender<SyncStatus>,
}

impl SyncClient {
    pub fn new(options: SyncClientOptions) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            api_base: options.api_base(),
            graphql_url: options.graphql_url(),
            device_id: options
                .device_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_device_id),
            default_iterations: options.iterations,
            key: RwLock::new(None),
            status: watch::Sender::new(SyncStatus::default()),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Base64url salt of the active key, once credentials are set.
    pub async fn salt(&self) -> Option<String> {
        self.key.read().await.as_ref().map(|k| k.salt.to_b64url())
    }

    /// Derives the snapshot key from the user's secret.
    ///
    /// PBKDF2 runs on the blocking pool.
    pub async fn set_credentials(&self, credentials: SyncCredentials) -> ClientResult<()> {
        let iterations = credentials.iterations.unwrap_or(self.default_iterations);
        let salt = match &credentials.salt {
            Some(encoded) => Salt::from_b64url(encoded)?,
            None => Salt::random(),
        };

        let secret = credentials.secret();
        let kdf_salt = salt.clone();
        let key = tokio::task::spawn_blocking(move || {
            derive_key(&secret, &kdf_salt, &KdfParams { iterations })
        })
        .await
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))??;

        *self.key.write().await = Some(KeyMaterial {
            key,
            salt,
            iterations,
        });
        self.status.send_replace(SyncStatus {
            mode: SyncMode::Standby,
            detail: "Credentials ready. Waiting for a sync action.".to_string(),
            ..SyncStatus::default()
        });
        debug!("Derived snapshot key with {} iterations", iterations);
        Ok(())
    }

    /// Registers a provider token with the service.
    pub async fn register_provider(
        &self,
        provider: SyncProvider,
        token: &ProviderToken,
    ) -> ClientResult<()> {
        let url = format!("{}/providers/{}/token", self.api_base, provider);
        let response = self.http.put(&url).json(token).send().await?;
        ensure_success(response).await?;

        self.status.send_modify(|status| {
            status.detail = format!("Token for provider {provider} updated.");
            status.last_error = None;
        });
        Ok(())
    }

    /// Encrypts and uploads a snapshot, returning the stored meta.
    pub async fn push_snapshot(&self, snapshot: PushSnapshot) -> ClientResult<SnapshotMeta> {
        let key_guard = self.key.read().await;
        let material = key_guard.as_ref().ok_or(ClientError::MissingCredentials)?;

        let json = match &snapshot.payload {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        };
        let hash = content_hash(json.as_bytes());

        self.mark_updating(
            snapshot.provider,
            format!("Sending snapshot to {}...", snapshot.provider),
        );
        let payload = seal_string(&material.key, &material.salt, material.iterations, &json)?;
        drop(key_guard);

        let body = PushBody {
            provider: snapshot.provider,
            project_id: &snapshot.project_id,
            device_id: &self.device_id,
            hash,
            updated_at: snapshot.updated_at.unwrap_or_else(|| now_millis() as f64),
            payload,
        };

        let result = async {
            let response = self
                .http
                .post(format!("{}/snapshots", self.api_base))
                .json(&body)
                .send()
                .await?;
            let response = ensure_success(response).await?;
            Ok::<_, ClientError>(response.json::<PushResponse>().await?.meta)
        }
        .await;

        self.finish(
            snapshot.provider,
            &result,
            "Failed to send snapshot.",
            format!("Last upload to {} completed.", snapshot.provider),
        );
        let meta = result?;
        info!(
            "Pushed snapshot for {}/{} ({} bytes)",
            meta.provider, meta.project_id, meta.size
        );
        Ok(meta)
    }

    /// Downloads and decrypts a snapshot.
    ///
    /// Returns the parsed JSON, or a JSON string when the plaintext is not
    /// JSON.
    pub async fn pull_snapshot(
        &self,
        provider: SyncProvider,
        project_id: &str,
    ) -> ClientResult<Value> {
        let key_guard = self.key.read().await;
        let material = key_guard.as_ref().ok_or(ClientError::MissingCredentials)?;

        self.mark_updating(provider, format!("Fetching snapshot from {provider}..."));

        let url = format!(
            "{}/snapshots/{}/{}",
            self.api_base,
            provider,
            urlencoding::encode(project_id)
        );
        let result = async {
            let response = ensure_success(self.http.get(&url).send().await?).await?;
            let data: SnapshotResponse = response.json().await?;
            Ok::<_, ClientError>(open_string(&material.key, &data.payload)?)
        }
        .await;

        self.finish(
            provider,
            &result,
            "Failed to fetch snapshot.",
            format!("Last download from {provider} completed."),
        );
        let plaintext = result?;
        Ok(serde_json::from_str(&plaintext).unwrap_or(Value::String(plaintext)))
    }

    /// Snapshots cached by the service, optionally for one provider.
    pub async fn list_snapshots(
        &self,
        provider: Option<SyncProvider>,
    ) -> ClientResult<Vec<SnapshotSummary>> {
        let response = self
            .http
            .post(&self.graphql_url)
            .json(&json!({
                "query": LIST_SNAPSHOTS,
                "variables": { "provider": provider },
            }))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: GraphQlResponse<SnapshotsData> = response.json().await?;
        if !body.errors.is_empty() {
            return Err(ClientError::GraphQl(
                body.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        Ok(body
            .data
            .map(|d| d.snapshots.into_iter().map(Into::into).collect())
            .unwrap_or_default())
    }

    fn mark_updating(&self, provider: SyncProvider, detail: String) {
        self.status.send_replace(SyncStatus {
            mode: SyncMode::Updating,
            detail,
            last_provider: Some(provider),
            last_synced_at: Some(now_millis()),
            last_error: None,
        });
    }

    fn finish<T>(
        &self,
        provider: SyncProvider,
        result: &ClientResult<T>,
        failure: &str,
        success: String,
    ) {
        let (mode, detail, last_error) = match result {
            Ok(_) => (SyncMode::Active, success, None),
            Err(e) => {
                warn!("Sync with {} failed: {}", provider, e);
                (SyncMode::Error, failure.to_string(), Some(e.to_string()))
            }
        };
        self.status.send_replace(SyncStatus {
            mode,
            detail,
            last_provider: Some(provider),
            last_synced_at: Some(now_millis()),
            last_error,
        });
    }
}

async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
