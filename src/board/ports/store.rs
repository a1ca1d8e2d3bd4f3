//! Store port for ordered-record persistence with per-bucket versioning.

use crate::board::domain::{BucketKey, ContainerKey, Item, ItemId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for item store operations.
pub type ItemStoreResult<T> = Result<T, ItemStoreError>;

/// A consistent read of one bucket: its active items in position order and
/// the version counter the next write must compare against.
#[derive(Debug, Clone)]
pub struct BucketSnapshot {
    /// The bucket that was read.
    pub bucket: BucketKey,
    /// Version counter at read time.
    pub version: u64,
    /// Active items of the bucket, position ascending.
    pub items: Vec<Item>,
}

impl BucketSnapshot {
    /// Returns the number of items holding a slot in the bucket.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the bucket holds no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An atomic write batch guarded by bucket version expectations.
///
/// The store applies every upsert and delete, and bumps every expected
/// bucket version, in one transaction; a single stale expectation fails the
/// whole batch with [`ItemStoreError::VersionConflict`].
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    expectations: Vec<(BucketKey, u64)>,
    upserts: Vec<Item>,
    deletes: Vec<ItemId>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version expectation for `bucket`.
    #[must_use]
    pub fn expecting(mut self, bucket: BucketKey, version: u64) -> Self {
        self.expectations.push((bucket, version));
        self
    }

    /// Adds an item write.
    #[must_use]
    pub fn upserting(mut self, item: Item) -> Self {
        self.upserts.push(item);
        self
    }

    /// Adds item writes.
    #[must_use]
    pub fn upserting_all(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.upserts.extend(items);
        self
    }

    /// Adds a physical record deletion.
    #[must_use]
    pub fn deleting(mut self, id: ItemId) -> Self {
        self.deletes.push(id);
        self
    }

    /// Returns the bucket version expectations.
    #[must_use]
    pub fn expectations(&self) -> &[(BucketKey, u64)] {
        &self.expectations
    }

    /// Returns the item writes.
    #[must_use]
    pub fn upserts(&self) -> &[Item] {
        &self.upserts
    }

    /// Returns the record deletions.
    #[must_use]
    pub fn deletes(&self) -> &[ItemId] {
        &self.deletes
    }

    /// Returns whether the change set carries no writes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Ordered-record persistence contract.
///
/// One authoritative store shared by possibly-concurrent sessions. Writes
/// are serialized per bucket through compare-and-swap on the version
/// counters carried by [`BucketSnapshot`] and [`ChangeSet`]; disjoint
/// buckets proceed independently.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Finds an item by identifier.
    ///
    /// Returns `None` when the item does not exist or has been purged.
    ///
    /// # Errors
    ///
    /// Returns [`ItemStoreError::Persistence`] on backend failure.
    async fn get(&self, id: ItemId) -> ItemStoreResult<Option<Item>>;

    /// Reads one bucket: active items in position order plus the bucket
    /// version.
    ///
    /// # Errors
    ///
    /// Returns [`ItemStoreError::Persistence`] on backend failure.
    async fn load_bucket(&self, bucket: &BucketKey) -> ItemStoreResult<BucketSnapshot>;

    /// Returns every non-purged item of a container, any lifecycle state,
    /// ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`ItemStoreError::Persistence`] on backend failure.
    async fn list_container(&self, container: &ContainerKey) -> ItemStoreResult<Vec<Item>>;

    /// Atomically applies a change set.
    ///
    /// # Errors
    ///
    /// Returns [`ItemStoreError::VersionConflict`] when any expected bucket
    /// version is stale, [`ItemStoreError::NotFound`] when a deletion names
    /// a missing record; nothing is applied in either case.
    async fn commit(&self, changes: ChangeSet) -> ItemStoreResult<()>;
}

/// Errors returned by item store implementations.
#[derive(Debug, Clone, Error)]
pub enum ItemStoreError {
    /// The item was not found.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// A bucket version expectation was stale.
    #[error("bucket {0} was modified concurrently")]
    VersionConflict(BucketKey),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ItemStoreError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
