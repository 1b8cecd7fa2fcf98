//! Persistence targets the write queue flushes into.

use crate::queue::QueuedOperation;
use anyhow::{bail, Context};
use async_trait::async_trait;
use marco_storage::{Collection, LocalStore};
use serde_json::Value;
use std::sync::Arc;

/// Receives each flushed batch.
///
/// A batch is cleared from the queue only when `persist` returns `Ok`.
#[async_trait]
pub trait FlushTarget: Send + Sync {
    async fn persist(&self, operations: &[QueuedOperation]) -> anyhow::Result<()>;
}

/// Writes each operation into one collection of a [`LocalStore`].
///
/// The record key is the operation's entity id, or else the collection's
/// key field inside `data`. `data` must be a JSON object.
pub struct StoreFlushTarget {
    store: Arc<LocalStore>,
    collection: Collection,
}

impl StoreFlushTarget {
    pub fn new(store: Arc<LocalStore>, collection: Collection) -> Self {
        Self { store, collection }
    }
}

#[async_trait]
impl FlushTarget for StoreFlushTarget {
    async fn persist(&self, operations: &[QueuedOperation]) -> anyhow::Result<()> {
        let store = Arc::clone(&self.store);
        let collection = self.collection;
        let operations = operations.to_vec();

        tokio::task::spawn_blocking(move || {
            let kv = store.collection(collection);
            for op in operations {
                let key = match op.coalesce_key() {
                    Some(id) => id.to_owned(),
                    None => match op.data.get(collection.key_field()) {
                        Some(Value::String(key)) if !key.is_empty() => key.clone(),
                        _ => bail!("operation for {collection} has no key"),
                    },
                };
                let Value::Object(record) = op.data else {
                    bail!("operation for {collection}/{key} is not a JSON object");
                };
                kv.set(&key, record)
                    .with_context(|| format!("writing {collection}/{key}"))?;
            }
            Ok(())
        })
        .await
        .context("store write task failed")?
    }
}
