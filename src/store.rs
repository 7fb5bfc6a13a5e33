//! In-memory button store, the single source of truth
//!
//! # Invariants
//! - Records are keyed only by the canonical `ButtonId`.
//! - `upsert` is the only mutation path besides `delete`, and always merges.
//! - Iteration follows insertion order.
//! - Ids handed out by `allocate_id` are never reissued for the store's lifetime.
//! - Mutations bump `revision`; nothing is written to disk from here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::merge::merge;
use crate::types::{Button, ButtonId, ButtonPatch};

/// Store handle shared between the HTTP workers
pub type SharedStore = Arc<Mutex<EntityStore>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("button store lock poisoned")]
    Poisoned,
}

/// Acquire the store for one serialized operation
pub fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, EntityStore>, StoreError> {
    store.lock().map_err(|_| StoreError::Poisoned)
}

/// Point-in-time copy of the store used for saving
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub revision: u64,
    pub records: Vec<(ButtonId, Button)>,
}

#[derive(Debug, Default)]
pub struct EntityStore {
    records: HashMap<ButtonId, Button>,
    order: Vec<ButtonId>,
    /// Highest id ever held or allocated
    high_water: u64,
    revision: u64,
    saved_revision: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean (not dirty) store from loaded records
    pub fn from_records(records: impl IntoIterator<Item = (ButtonId, Button)>) -> Self {
        let mut store = Self::new();
        for (id, button) in records {
            store.insert_record(id, button);
        }
        store
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, id: ButtonId) -> Option<&Button> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: ButtonId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ButtonId, &Button)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).map(|button| (*id, button)))
    }

    /// Owned copy of every record in insertion order
    pub fn all(&self) -> Vec<(ButtonId, Button)> {
        self.iter().map(|(id, button)| (id, button.clone())).collect()
    }

    /// Merge `patch` into the record for `id`, creating it if unknown
    pub fn upsert(&mut self, id: ButtonId, patch: &ButtonPatch) -> Button {
        let merged = merge(self.records.get(&id), patch);
        let created = !self.records.contains_key(&id);
        self.insert_record(id, merged.clone());
        self.revision += 1;
        debug!(id = %id, created, x = merged.x, y = merged.y, width = merged.width, height = merged.height, "Upserted button");
        merged
    }

    /// Remove `id`; returns whether it existed
    pub fn delete(&mut self, id: ButtonId) -> bool {
        if self.records.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|&existing| existing != id);
        self.revision += 1;
        debug!(id = %id, "Deleted button");
        true
    }

    /// Next free id: one past the larger of the record count and every id seen
    pub fn allocate_id(&mut self) -> ButtonId {
        let next = self.high_water.max(self.order.len() as u64) + 1;
        self.high_water = next;
        ButtonId::new(next)
    }

    #[cfg(test)]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Record that the state at `revision` reached disk
    pub fn mark_saved(&mut self, revision: u64) {
        if revision > self.saved_revision {
            self.saved_revision = revision;
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            records: self.all(),
        }
    }

    fn insert_record(&mut self, id: ButtonId, button: Button) {
        if self.records.insert(id, button).is_none() {
            self.order.push(id);
        }
        self.high_water = self.high_water.max(id.get());
    }
}
