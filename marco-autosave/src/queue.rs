//! Pending operations and their coalescing rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A unit of work handed to the persistence target.
///
/// Operations sharing an `entity_id` are the same logical unit of work;
/// only the latest one queued is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub data: Value,
}

impl QueuedOperation {
    /// An operation that replaces any pending one for the same entity.
    pub fn entity(entity_id: impl Into<String>, data: Value) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            data,
        }
    }

    /// An independent operation, never coalesced.
    pub fn detached(data: Value) -> Self {
        Self {
            entity_id: None,
            data,
        }
    }

    /// The coalescing key. An empty id counts as none.
    pub fn coalesce_key(&self) -> Option<&str> {
        self.entity_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Operations waiting for the next flush.
///
/// Entity operations are kept in first-queued order of their ids; a later
/// value for a known id replaces the old one in place. Detached operations
/// follow in arrival order.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    by_entity: HashMap<String, QueuedOperation>,
    order: Vec<String>,
    detached: Vec<QueuedOperation>,
}

impl PendingQueue {
    pub(crate) fn push(&mut self, op: QueuedOperation) {
        match op.coalesce_key().map(str::to_owned) {
            Some(id) => {
                if self.by_entity.insert(id.clone(), op).is_none() {
                    self.order.push(id);
                }
            }
            None => self.detached.push(op),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_entity.len() + self.detached.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns everything in flush order.
    pub(crate) fn take(&mut self) -> Vec<QueuedOperation> {
        let mut by_entity = std::mem::take(&mut self.by_entity);
        let mut ops: Vec<_> = std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|id| by_entity.remove(&id))
            .collect();
        ops.append(&mut self.detached);
        ops
    }

    /// Puts a failed batch back in front of anything queued since it was
    /// taken. A newer value for an entity wins over the one in the batch.
    pub(crate) fn restore(&mut self, batch: Vec<QueuedOperation>) {
        let newer = std::mem::take(self).take();
        for op in batch.into_iter().chain(newer) {
            self.push(op);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.by_entity.clear();
        self.order.clear();
        self.detached.clear();
    }
}
