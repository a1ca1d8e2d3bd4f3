//! In-memory item store for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::board::domain::{BucketKey, ContainerKey, Item, ItemId, LifecycleState};
use crate::board::ports::{
    BucketSnapshot, ChangeSet, ItemStore, ItemStoreError, ItemStoreResult,
};

/// Thread-safe in-memory item store with per-bucket version counters.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemStore {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    items: HashMap<ItemId, Item>,
    versions: HashMap<BucketKey, u64>,
}

impl InMemoryItemStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites one record directly, bypassing bucket versioning.
    ///
    /// Test-support entry point for simulating external mutation (bulk
    /// imports and the like) that desynchronizes positions.
    ///
    /// # Errors
    ///
    /// Returns [`ItemStoreError::Persistence`] when the state lock is
    /// poisoned.
    pub fn put_unchecked(&self, item: Item) -> ItemStoreResult<()> {
        let mut state = write_state(&self.state)?;
        state.items.insert(item.id(), item);
        Ok(())
    }
}

fn write_state(
    state: &Arc<RwLock<InMemoryState>>,
) -> ItemStoreResult<std::sync::RwLockWriteGuard<'_, InMemoryState>> {
    state
        .write()
        .map_err(|err| ItemStoreError::persistence(std::io::Error::other(err.to_string())))
}

fn read_state(
    state: &Arc<RwLock<InMemoryState>>,
) -> ItemStoreResult<std::sync::RwLockReadGuard<'_, InMemoryState>> {
    state
        .read()
        .map_err(|err| ItemStoreError::persistence(std::io::Error::other(err.to_string())))
}

/// Active members of a bucket, position ascending with creation time as the
/// tie-break so desynchronized buckets still list deterministically.
fn bucket_members(state: &InMemoryState, bucket: &BucketKey) -> Vec<Item> {
    let mut members: Vec<Item> = state
        .items
        .values()
        .filter(|item| item.lifecycle_state() == LifecycleState::Active)
        .filter(|item| item.bucket() == *bucket)
        .cloned()
        .collect();
    members.sort_by_key(|item| (item.position(), item.created_at()));
    members
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get(&self, id: ItemId) -> ItemStoreResult<Option<Item>> {
        let state = read_state(&self.state)?;
        Ok(state.items.get(&id).cloned())
    }

    async fn load_bucket(&self, bucket: &BucketKey) -> ItemStoreResult<BucketSnapshot> {
        let state = read_state(&self.state)?;
        Ok(BucketSnapshot {
            bucket: bucket.clone(),
            version: state.versions.get(bucket).copied().unwrap_or(0),
            items: bucket_members(&state, bucket),
        })
    }

    async fn list_container(&self, container: &ContainerKey) -> ItemStoreResult<Vec<Item>> {
        let state = read_state(&self.state)?;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.container() == container)
            .cloned()
            .collect();
        items.sort_by_key(Item::created_at);
        Ok(items)
    }

    async fn commit(&self, changes: ChangeSet) -> ItemStoreResult<()> {
        let mut state = write_state(&self.state)?;

        for (bucket, expected) in changes.expectations() {
            let current = state.versions.get(bucket).copied().unwrap_or(0);
            if current != *expected {
                return Err(ItemStoreError::VersionConflict(bucket.clone()));
            }
        }
        for id in changes.deletes() {
            if !state.items.contains_key(id) {
                return Err(ItemStoreError::NotFound(*id));
            }
        }

        // All checks passed; apply everything in one critical section.
        for id in changes.deletes() {
            state.items.remove(id);
        }
        for item in changes.upserts() {
            state.items.insert(item.id(), item.clone());
        }
        for (bucket, expected) in changes.expectations() {
            state.versions.insert(bucket.clone(), expected + 1);
        }
        Ok(())
    }
}
