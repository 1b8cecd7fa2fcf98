//! Snapshot service: the cache plus provider fan-out and cold-cache pulls.
//!
//! Both the REST and GraphQL surfaces go through [`SnapshotService`], so the
//! two APIs share one set of semantics.

use crate::error::{ServiceError, ServiceResult};
use crate::store::SnapshotStore;
use crate::validation::{validate_snapshot_input, validate_token};
use marco_cloud::{CloudError, ProviderRegistry};
use marco_types::{ProviderToken, SnapshotInput, SnapshotRecord, SyncProvider};
use tracing::{debug, info, warn};

pub struct SnapshotService {
    store: SnapshotStore,
    providers: ProviderRegistry,
}

impl SnapshotService {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            store: SnapshotStore::new(),
            providers,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Registers (or replaces) the bearer token used for a provider.
    pub async fn register_token(
        &self,
        provider: SyncProvider,
        token: ProviderToken,
    ) -> ServiceResult<()> {
        validate_token(&token)?;
        self.providers.set_token(provider, token).await;
        Ok(())
    }

    /// Stores a snapshot, then mirrors it to its provider.
    ///
    /// The local upsert is authoritative: a failed mirror is logged and the
    /// stored record is still returned.
    pub async fn push(&self, input: SnapshotInput) -> ServiceResult<SnapshotRecord> {
        validate_snapshot_input(&input)?;
        let record = self.store.upsert(input).await;
        debug!(
            "Stored snapshot {} for {}/{}",
            record.id, record.meta.provider, record.meta.project_id
        );

        if let Err(e) = self.providers.push(&record).await {
            warn!(
                "Mirroring snapshot for {}/{} failed: {}",
                record.meta.provider, record.meta.project_id, e
            );
        }
        Ok(record)
    }

    /// Returns the cached snapshot, pulling from the provider on a miss.
    ///
    /// A successful pull repopulates the cache. A missing token is an
    /// error; any other pull failure is logged and reported as no record.
    pub async fn fetch(
        &self,
        provider: SyncProvider,
        project_id: &str,
    ) -> ServiceResult<Option<SnapshotRecord>> {
        if let Some(record) = self.store.get(provider, project_id).await {
            return Ok(Some(record));
        }

        match self.providers.pull(provider, project_id).await {
            Ok(Some(pulled)) => {
                let record = self.store.upsert(SnapshotInput::from(&pulled)).await;
                info!(
                    "Restored snapshot for {}/{} from provider",
                    provider, project_id
                );
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(CloudError::MissingToken(p)) => Err(ServiceError::MissingCredentials(p)),
            Err(e) => {
                warn!("Pull for {}/{} failed: {}", provider, project_id, e);
                Ok(None)
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but a miss is [`ServiceError::NotFound`].
    pub async fn fetch_required(
        &self,
        provider: SyncProvider,
        project_id: &str,
    ) -> ServiceResult<SnapshotRecord> {
        self.fetch(provider, project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                provider,
                project_id: project_id.to_string(),
            })
    }

    /// Cached snapshots, optionally for one provider.
    pub async fn list(&self, provider: Option<SyncProvider>) -> Vec<SnapshotRecord> {
        self.store.list(provider).await
    }

    /// Drops a cached snapshot; the provider copy is untouched.
    pub async fn evict(&self, provider: SyncProvider, project_id: &str) -> bool {
        self.store.remove(provider, project_id).await.is_some()
    }
}
