//! Dense position ordering within status buckets.

use super::{BoardError, BoardResult};
use crate::board::domain::{BoardDomainError, BucketKey, Item, ItemId, Status};
use crate::board::ports::{ChangeSet, ItemStore, ItemStoreError};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Attempts per operation before a contended bucket is surfaced to the
/// caller as [`BoardError::ConcurrentModification`].
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Backoff before the first retry; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(25);

/// Maintains dense, unique positions within each `(container, status)`
/// bucket.
///
/// The index is the only writer of item positions, and every single-item
/// rewrite flows through it so the commit is always covered by the item's
/// bucket version. Every mutation reads a versioned bucket snapshot,
/// computes the full new ordering in memory, verifies density, and commits
/// atomically with compare-and-swap on the bucket version; stale versions
/// are retried with exponential backoff against a freshly loaded snapshot
/// and a freshly loaded aggregate, so a retry can never replay state from
/// before a concurrently committed write.
pub struct PositionIndex<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for PositionIndex<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> PositionIndex<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    /// Creates a new position index over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Inserts `item` into its status bucket.
    ///
    /// With `at = None` the item is appended; otherwise existing items at
    /// `position >= at` shift up by one. Out-of-range positions clamp to
    /// the end. Returns the stored item with its assigned slot.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::ConcurrentModification`] when the bucket stays
    /// contended through every retry, [`BoardError::InvariantViolation`]
    /// when the computed ordering is not dense.
    pub async fn insert(&self, item: Item, at: Option<u32>) -> BoardResult<Item> {
        with_retries(|| self.try_insert(&item, at)).await
    }

    /// Moves an item to `to_status` at `to_position` (`None` appends).
    ///
    /// A same-bucket move is a single reorder computed in one pass; a
    /// cross-bucket move closes the source gap and opens the target slot in
    /// one atomic commit guarded by both bucket versions. Status changes
    /// into or out of a terminal column update the completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardError::Domain`] when it is off the board or the target column
    /// belongs to another kind, [`BoardError::ConcurrentModification`] when
    /// retries are exhausted.
    pub async fn move_item(
        &self,
        id: ItemId,
        to_status: Status,
        to_position: Option<u32>,
    ) -> BoardResult<Item> {
        with_retries(|| self.try_move(id, to_status, to_position)).await
    }

    /// Takes an item out of its status bucket through `transition`, closing
    /// the gap it leaves behind.
    ///
    /// The record itself stays in the store without a slot; physical
    /// deletion is the purge path. `transition` is applied to a freshly
    /// loaded aggregate on every attempt and the bucket surgery lands in
    /// the same version-guarded commit, so a move committed by a concurrent
    /// session is retried against, never overwritten. Items that already
    /// hold no slot take the same guarded write.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardError::Domain`] when `transition` rejects the current state,
    /// [`BoardError::ConcurrentModification`] when retries are exhausted.
    pub async fn remove<F>(&self, id: ItemId, transition: F) -> BoardResult<Item>
    where
        F: Fn(&mut Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        with_retries(|| self.try_remove(id, &transition)).await
    }

    /// Puts an off-board item back into a slot through `transition`,
    /// appending it at the end of its status bucket.
    ///
    /// Like [`PositionIndex::remove`], the aggregate is reloaded and
    /// re-transitioned on every attempt.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardError::Domain`] when `transition` rejects the current state,
    /// [`BoardError::ConcurrentModification`] when retries are exhausted.
    pub async fn reinstate<F>(&self, id: ItemId, transition: F) -> BoardResult<Item>
    where
        F: Fn(&mut Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        with_retries(|| self.try_reinstate(id, &transition)).await
    }

    /// Rewrites an item in place through `mutate`, leaving its slot alone.
    ///
    /// The commit still carries the bucket version so the rewrite
    /// serializes against concurrent reorders; the position written back is
    /// always the one read under that version, never a stale copy.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardError::Domain`] when `mutate` rejects the current state,
    /// [`BoardError::ConcurrentModification`] when retries are exhausted.
    pub async fn revise<F>(&self, id: ItemId, mutate: F) -> BoardResult<Item>
    where
        F: Fn(&mut Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        with_retries(|| self.try_revise(id, &mutate)).await
    }

    /// Physically deletes an item once `guard` accepts its current state.
    ///
    /// The delete is guarded by the item's bucket version, so a concurrent
    /// restore wins the race instead of being resurrected over.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardError::Domain`] when `guard` rejects the current state,
    /// [`BoardError::ConcurrentModification`] when retries are exhausted.
    pub async fn discard<F>(&self, id: ItemId, guard: F) -> BoardResult<()>
    where
        F: Fn(&Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        with_retries(|| self.try_discard(id, &guard)).await
    }

    /// Recomputes positions `0..n-1` for `bucket` from its current order.
    ///
    /// Self-healing entry point for externally desynchronized positions
    /// (bulk imports and the like). Returns the repaired ordering.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::ConcurrentModification`] when retries are
    /// exhausted.
    pub async fn reindex(&self, bucket: &BucketKey) -> BoardResult<Vec<Item>> {
        with_retries(|| self.try_reindex(bucket)).await
    }

    async fn try_insert(&self, item: &Item, at: Option<u32>) -> BoardResult<Item> {
        let bucket = item.bucket();
        let snapshot = self.store.load_bucket(&bucket).await?;
        let mut items = snapshot.items;
        items.retain(|existing| existing.id() != item.id());

        let at_index = at.map_or(items.len(), |slot| index_for(slot, items.len()));
        items.insert(at_index, item.clone());

        let changes = renumber(&bucket, snapshot.version, &mut items, Some(item.id()))?;
        self.store.commit(changes).await?;
        stored_copy(&items, item.id(), &bucket)
    }

    async fn try_move(
        &self,
        id: ItemId,
        to_status: Status,
        to_position: Option<u32>,
    ) -> BoardResult<Item> {
        let current = self.fetch(id).await?;
        if !current.is_active() {
            return Err(BoardError::Domain(BoardDomainError::NotActive {
                state: current.lifecycle_state(),
            }));
        }
        to_status.ensure_kind(current.kind())?;

        let from_bucket = current.bucket();
        let to_bucket = BucketKey::new(current.container().clone(), to_status);
        if from_bucket == to_bucket {
            self.reorder_within(&from_bucket, id, to_position).await
        } else {
            self.move_across(&current, &from_bucket, &to_bucket, to_position)
                .await
        }
    }

    /// Same-bucket reorder: virtual remove-then-insert computed in one
    /// pass, so density never transiently breaks.
    async fn reorder_within(
        &self,
        bucket: &BucketKey,
        id: ItemId,
        to_position: Option<u32>,
    ) -> BoardResult<Item> {
        let snapshot = self.store.load_bucket(bucket).await?;
        let mut items = snapshot.items;
        let Some(current_index) = items.iter().position(|entry| entry.id() == id) else {
            return Err(invariant_violation(
                bucket,
                format!("active item {id} is missing from its bucket"),
            ));
        };

        let last_index = items.len().saturating_sub(1);
        let target_index = to_position.map_or(last_index, |slot| index_for(slot, last_index));
        if target_index == current_index {
            return stored_copy(&items, id, bucket);
        }

        let moved = items.remove(current_index);
        items.insert(target_index, moved);

        let changes = renumber(bucket, snapshot.version, &mut items, None)?;
        self.store.commit(changes).await?;
        stored_copy(&items, id, bucket)
    }

    async fn move_across(
        &self,
        current: &Item,
        from_bucket: &BucketKey,
        to_bucket: &BucketKey,
        to_position: Option<u32>,
    ) -> BoardResult<Item> {
        let mut moved = current.clone();
        moved.set_status(to_bucket.status(), &*self.clock)?;

        let from_snapshot = self.store.load_bucket(from_bucket).await?;
        let to_snapshot = self.store.load_bucket(to_bucket).await?;

        let mut source_items = from_snapshot.items;
        source_items.retain(|entry| entry.id() != moved.id());
        let mut target_items = to_snapshot.items;
        target_items.retain(|entry| entry.id() != moved.id());

        let at_index = to_position.map_or(target_items.len(), |slot| {
            index_for(slot, target_items.len())
        });
        target_items.insert(at_index, moved.clone());

        let source_changes = renumber(from_bucket, from_snapshot.version, &mut source_items, None)?;
        let target_changes = renumber(
            to_bucket,
            to_snapshot.version,
            &mut target_items,
            Some(moved.id()),
        )?;
        self.store.commit(merge(source_changes, target_changes)).await?;
        stored_copy(&target_items, moved.id(), to_bucket)
    }

    async fn try_remove<F>(&self, id: ItemId, transition: &F) -> BoardResult<Item>
    where
        F: Fn(&mut Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        let fetched = self.fetch(id).await?;
        let bucket = fetched.bucket();
        let snapshot = self.store.load_bucket(&bucket).await?;
        let mut items = snapshot.items;

        let held = items.iter().find(|entry| entry.id() == id).cloned();
        if fetched.is_active() && held.is_none() {
            // The item changed buckets between the two reads; retry
            // against its new placement.
            return Err(BoardError::Store(ItemStoreError::VersionConflict(bucket)));
        }
        items.retain(|entry| entry.id() != id);

        // The snapshot copy is the one the version guard covers; fall back
        // to the fetched record only when the item holds no slot.
        let mut detached = held.unwrap_or(fetched);
        transition(&mut detached)?;
        detached.clear_position();

        let changes =
            renumber(&bucket, snapshot.version, &mut items, None)?.upserting(detached.clone());
        self.store.commit(changes).await?;
        Ok(detached)
    }

    async fn try_reinstate<F>(&self, id: ItemId, transition: &F) -> BoardResult<Item>
    where
        F: Fn(&mut Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        let mut restored = self.fetch(id).await?;
        transition(&mut restored)?;

        let bucket = restored.bucket();
        let snapshot = self.store.load_bucket(&bucket).await?;
        let mut items = snapshot.items;
        items.retain(|entry| entry.id() != id);
        items.push(restored);

        let changes = renumber(&bucket, snapshot.version, &mut items, Some(id))?;
        self.store.commit(changes).await?;
        stored_copy(&items, id, &bucket)
    }

    async fn try_revise<F>(&self, id: ItemId, mutate: &F) -> BoardResult<Item>
    where
        F: Fn(&mut Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        let fetched = self.fetch(id).await?;
        let bucket = fetched.bucket();
        let snapshot = self.store.load_bucket(&bucket).await?;

        let held = snapshot
            .items
            .iter()
            .find(|entry| entry.id() == id)
            .cloned();
        if fetched.is_active() && held.is_none() {
            return Err(BoardError::Store(ItemStoreError::VersionConflict(bucket)));
        }

        let mut revised = held.unwrap_or(fetched);
        mutate(&mut revised)?;

        let changes = ChangeSet::new()
            .expecting(bucket, snapshot.version)
            .upserting(revised.clone());
        self.store.commit(changes).await?;
        Ok(revised)
    }

    async fn try_discard<F>(&self, id: ItemId, guard: &F) -> BoardResult<()>
    where
        F: Fn(&Item) -> Result<(), BoardDomainError> + Send + Sync,
    {
        let fetched = self.fetch(id).await?;
        guard(&fetched)?;

        let bucket = fetched.bucket();
        let snapshot = self.store.load_bucket(&bucket).await?;
        if snapshot.items.iter().any(|entry| entry.id() == id) {
            // A concurrent restore put the item back on the board.
            return Err(BoardError::Store(ItemStoreError::VersionConflict(bucket)));
        }

        let changes = ChangeSet::new()
            .expecting(bucket, snapshot.version)
            .deleting(id);
        self.store.commit(changes).await?;
        Ok(())
    }

    async fn try_reindex(&self, bucket: &BucketKey) -> BoardResult<Vec<Item>> {
        let snapshot = self.store.load_bucket(bucket).await?;
        let mut items = snapshot.items;
        let changes = renumber(bucket, snapshot.version, &mut items, None)?;
        if changes.is_empty() {
            return Ok(items);
        }
        self.store.commit(changes).await?;
        Ok(items)
    }

    async fn fetch(&self, id: ItemId) -> BoardResult<Item> {
        self.store.get(id).await?.ok_or(BoardError::NotFound(id))
    }
}

/// Runs `operation`, retrying version conflicts with exponential backoff.
async fn with_retries<T, F, Fut>(operation: F) -> BoardResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = BoardResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Err(BoardError::Store(ItemStoreError::VersionConflict(bucket))) => {
                attempt += 1;
                if attempt >= MAX_COMMIT_ATTEMPTS {
                    return Err(BoardError::ConcurrentModification(bucket));
                }
                tracing::warn!(bucket = %bucket, attempt, "bucket write conflicted, retrying");
                tokio::time::sleep(RETRY_BASE_DELAY * 2_u32.saturating_pow(attempt - 1)).await;
            }
            other => return other,
        }
    }
}

/// Clamps a requested slot to a valid insertion index.
fn index_for(slot: u32, last: usize) -> usize {
    usize::try_from(slot).map_or(last, |index| index.min(last))
}

/// Renumbers `items` to `0..n-1`, verifies density, and returns the change
/// set of every entry whose slot moved (plus `always_write`, if present).
fn renumber(
    bucket: &BucketKey,
    version: u64,
    items: &mut [Item],
    always_write: Option<ItemId>,
) -> BoardResult<ChangeSet> {
    let mut changes = ChangeSet::new().expecting(bucket.clone(), version);
    for (index, entry) in items.iter_mut().enumerate() {
        let slot = u32::try_from(index).map_err(|_| {
            invariant_violation(bucket, format!("bucket length {index} overflows a slot"))
        })?;
        let unchanged = entry.position() == Some(slot);
        entry.assign_position(slot);
        if !unchanged || always_write == Some(entry.id()) {
            changes = changes.upserting(entry.clone());
        }
    }
    verify_density(bucket, items)?;
    Ok(changes)
}

/// Checks that positions form exactly `0..n-1` with unique ids.
fn verify_density(bucket: &BucketKey, items: &[Item]) -> BoardResult<()> {
    for (index, entry) in items.iter().enumerate() {
        let expected = u32::try_from(index).ok();
        if entry.position() != expected {
            return Err(invariant_violation(
                bucket,
                format!(
                    "item {} holds position {:?}, expected {:?}",
                    entry.id(),
                    entry.position(),
                    expected
                ),
            ));
        }
        if items
            .iter()
            .skip(index + 1)
            .any(|other| other.id() == entry.id())
        {
            return Err(invariant_violation(
                bucket,
                format!("item {} appears more than once", entry.id()),
            ));
        }
    }
    Ok(())
}

fn invariant_violation(bucket: &BucketKey, detail: String) -> BoardError {
    tracing::error!(bucket = %bucket, detail = %detail, "bucket density invariant violated");
    BoardError::InvariantViolation {
        bucket: bucket.clone(),
        detail,
    }
}

/// Returns the committed copy of `id` out of the new bucket ordering.
fn stored_copy(items: &[Item], id: ItemId, bucket: &BucketKey) -> BoardResult<Item> {
    items
        .iter()
        .find(|entry| entry.id() == id)
        .cloned()
        .ok_or_else(|| invariant_violation(bucket, format!("item {id} vanished during commit")))
}

/// Folds two per-bucket change sets into one atomic commit.
fn merge(first: ChangeSet, second: ChangeSet) -> ChangeSet {
    let mut merged = ChangeSet::new();
    for (bucket, version) in first.expectations().iter().chain(second.expectations()) {
        merged = merged.expecting(bucket.clone(), *version);
    }
    merged = merged.upserting_all(first.upserts().iter().cloned());
    merged = merged.upserting_all(second.upserts().iter().cloned());
    for id in first.deletes().iter().chain(second.deletes()) {
        merged = merged.deleting(*id);
    }
    merged
}
