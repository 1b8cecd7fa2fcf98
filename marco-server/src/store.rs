//! In-memory cache of the latest snapshot per `(provider, project)`.

use marco_types::{now_millis, SnapshotId, SnapshotInput, SnapshotMeta, SnapshotRecord, SyncProvider};
use std::collections::HashMap;
use tokio::sync::RwLock;

type Key = (SyncProvider, String);

/// Latest snapshot per `(provider, project_id)`.
///
/// `upsert` is unconditionally last-writer-wins: it never compares the
/// incoming `updated_at` with the stored one, so a stale push that arrives
/// after a newer one replaces it. Callers sequence their own pushes.
#[derive(Default)]
pub struct SnapshotStore {
    records: RwLock<HashMap<Key, SnapshotRecord>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces the record for the input's pair.
    ///
    /// `id` and `created_at` survive replacement; meta, payload and
    /// `updated_at` always take the incoming values.
    pub async fn upsert(&self, input: SnapshotInput) -> SnapshotRecord {
        let now = now_millis();
        let key = (input.provider, input.project_id.clone());
        let mut records = self.records.write().await;

        let (id, created_at) = match records.get(&key) {
            Some(existing) => (existing.id.clone(), existing.created_at),
            None => (SnapshotId::generate(), now),
        };

        let record = SnapshotRecord {
            id,
            meta: SnapshotMeta {
                provider: input.provider,
                project_id: input.project_id,
                device_id: input.device_id,
                hash: input.hash,
                updated_at: input.updated_at,
                size: input.payload.encoded_size(),
            },
            payload: input.payload,
            created_at,
            updated_at: now,
        };
        records.insert(key, record.clone());
        record
    }

    pub async fn get(&self, provider: SyncProvider, project_id: &str) -> Option<SnapshotRecord> {
        self.records
            .read()
            .await
            .get(&(provider, project_id.to_string()))
            .cloned()
    }

    /// All records, optionally for one provider, ordered by provider then
    /// project id.
    pub async fn list(&self, provider: Option<SyncProvider>) -> Vec<SnapshotRecord> {
        let records = self.records.read().await;
        let mut list: Vec<SnapshotRecord> = records
            .values()
            .filter(|r| provider.is_none_or(|p| r.meta.provider == p))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.key().cmp(&b.key()));
        list
    }

    /// Evicts a cached record.
    pub async fn remove(&self, provider: SyncProvider, project_id: &str) -> Option<SnapshotRecord> {
        self.records
            .write()
            .await
            .remove(&(provider, project_id.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
