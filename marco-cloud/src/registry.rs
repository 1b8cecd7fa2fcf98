//! Adapters and bearer tokens, per provider.

use crate::client::ProviderClient;
use crate::error::{CloudError, CloudResult};
use crate::google_drive::GoogleDriveClient;
use crate::onedrive::OneDriveClient;
use marco_types::{now_millis, ProviderToken, SnapshotRecord, SyncProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Routes pushes and pulls to the adapter of each provider, supplying the
/// token registered for it.
///
/// Tokens are held in memory only and are never persisted.
#[derive(Default)]
pub struct ProviderRegistry {
    clients: HashMap<SyncProvider, Arc<dyn ProviderClient>>,
    tokens: RwLock<HashMap<SyncProvider, ProviderToken>>,
}

impl ProviderRegistry {
    /// A registry with no adapters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the production Google Drive and OneDrive adapters.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_client(Arc::new(GoogleDriveClient::default()))
            .with_client(Arc::new(OneDriveClient::default()))
    }

    /// Registers an adapter, replacing any previous one for its provider.
    pub fn with_client(mut self, client: Arc<dyn ProviderClient>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    pub async fn set_token(&self, provider: SyncProvider, token: ProviderToken) {
        debug!("Registered token for provider {}", provider);
        self.tokens.write().await.insert(provider, token);
    }

    pub async fn token(&self, provider: SyncProvider) -> Option<ProviderToken> {
        self.tokens.read().await.get(&provider).cloned()
    }

    /// Mirrors a record to its provider.
    pub async fn push(&self, record: &SnapshotRecord) -> CloudResult<()> {
        let provider = record.meta.provider;
        let (client, token) = self.resolve(provider).await?;
        client.push(record, &token).await
    }

    /// Fetches a project's record from a provider.
    pub async fn pull(
        &self,
        provider: SyncProvider,
        project_id: &str,
    ) -> CloudResult<Option<SnapshotRecord>> {
        let (client, token) = self.resolve(provider).await?;
        client.pull(project_id, &token).await
    }

    async fn resolve(
        &self,
        provider: SyncProvider,
    ) -> CloudResult<(Arc<dyn ProviderClient>, ProviderToken)> {
        let token = self
            .token(provider)
            .await
            .ok_or(CloudError::MissingToken(provider))?;
        if token.is_expired_at(now_millis()) {
            warn!("Token for provider {} has expired; using it anyway", provider);
        }
        let client = self
            .clients
            .get(&provider)
            .cloned()
            .ok_or(CloudError::NoAdapter(provider))?;
        Ok((client, token))
    }
}
