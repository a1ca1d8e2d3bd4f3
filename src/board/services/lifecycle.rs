//! Lifecycle orchestration: status toggles, archive, recycle bin, purge.

use super::{BoardError, BoardResult, PositionIndex};
use crate::board::domain::{
    BoardDomainError, ContainerKey, Item, ItemId, ItemKind, LifecycleState, Status,
};
use crate::board::ports::{ChangeNotifier, ItemStore};
use mockable::Clock;
use std::sync::Arc;

/// Per-item result of a bulk lifecycle operation.
///
/// Bulk operations apply each transition independently; one failed id never
/// blocks the others.
#[derive(Debug)]
pub struct BulkOutcome {
    /// The item the transition was applied to.
    pub id: ItemId,
    /// Outcome for this item.
    pub result: BoardResult<()>,
}

/// Drives items through the retention lifecycle and keeps their buckets
/// healed along the way.
///
/// The service is the only writer of lifecycle fields; every committed
/// mutation fires the change notifier so views can refetch instead of
/// reloading.
pub struct LifecycleService<S, C, N>
where
    S: ItemStore,
    C: Clock + Send + Sync,
    N: ChangeNotifier,
{
    store: Arc<S>,
    clock: Arc<C>,
    index: PositionIndex<S, C>,
    notifier: Arc<N>,
}

impl<S, C, N> Clone for LifecycleService<S, C, N>
where
    S: ItemStore,
    C: Clock + Send + Sync,
    N: ChangeNotifier,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            index: self.index.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S, C, N> LifecycleService<S, C, N>
where
    S: ItemStore,
    C: Clock + Send + Sync,
    N: ChangeNotifier,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, notifier: Arc<N>) -> Self {
        let index = PositionIndex::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            store,
            clock,
            index,
            notifier,
        }
    }

    /// Returns the position index the service heals buckets through.
    #[must_use]
    pub const fn index(&self) -> &PositionIndex<S, C> {
        &self.index
    }

    /// Creates a new item in the initial column of its board, appended at
    /// the end of the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::ConcurrentModification`] when the bucket stays
    /// contended through every retry.
    pub async fn create(
        &self,
        container: ContainerKey,
        kind: ItemKind,
        title: impl Into<String> + Send,
    ) -> BoardResult<Item> {
        let item = Item::new(container.clone(), kind, title, &*self.clock);
        let stored = self.index.insert(item, None).await?;
        self.notify(&container);
        Ok(stored)
    }

    /// Renames an item. No position impact: the write goes through the
    /// position index so it can never carry a stale slot over a concurrent
    /// reorder.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardError::ConcurrentModification`] when the bucket stays
    /// contended through every retry.
    pub async fn rename(
        &self,
        id: ItemId,
        title: impl Into<String> + Send,
    ) -> BoardResult<Item> {
        let title = title.into();
        let clock = Arc::clone(&self.clock);
        let stored = self
            .index
            .revise(id, move |item| {
                item.rename(title.clone(), &*clock);
                Ok(())
            })
            .await?;
        self.notify(stored.container());
        Ok(stored)
    }

    /// Marks an item as finished, moving it to the end of the terminal
    /// column and stamping its completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist, or a
    /// domain error when it is off the board or already completed.
    pub async fn complete(&self, id: ItemId) -> BoardResult<Item> {
        let item = self.fetch(id).await?;
        ensure_active(&item)?;
        if item.status().is_terminal() {
            return Err(BoardError::Domain(BoardDomainError::AlreadyCompleted {
                status: item.status(),
            }));
        }
        let stored = self
            .index
            .move_item(id, Status::terminal(item.kind()), None)
            .await?;
        self.notify(stored.container());
        Ok(stored)
    }

    /// Reopens a finished item, moving it to the end of the initial column
    /// and clearing its completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist, or a
    /// domain error when it is off the board or not completed.
    pub async fn reopen(&self, id: ItemId) -> BoardResult<Item> {
        let item = self.fetch(id).await?;
        ensure_active(&item)?;
        if !item.status().is_terminal() {
            return Err(BoardError::Domain(BoardDomainError::NotCompleted {
                status: item.status(),
            }));
        }
        let stored = self
            .index
            .move_item(id, Status::initial(item.kind()), None)
            .await?;
        self.notify(stored.container());
        Ok(stored)
    }

    /// Archives a finished item, taking it off the board and closing the
    /// gap it leaves behind.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist,
    /// [`BoardDomainError::ArchiveRequiresTerminalStatus`] when it is not
    /// finished.
    pub async fn archive(&self, id: ItemId) -> BoardResult<Item> {
        let clock = Arc::clone(&self.clock);
        let stored = self
            .index
            .remove(id, move |item| item.archive(&*clock))
            .await?;
        self.notify(stored.container());
        Ok(stored)
    }

    /// Moves an item to the recycle bin, from the board or the archive.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist, or a
    /// domain error when it is already recycled.
    pub async fn recycle(&self, id: ItemId) -> BoardResult<Item> {
        // Archived items hold no bucket slot; the index applies the same
        // guarded write either way.
        let clock = Arc::clone(&self.clock);
        let stored = self
            .index
            .remove(id, move |item| item.recycle(&*clock))
            .await?;
        self.notify(stored.container());
        Ok(stored)
    }

    /// Restores an archived or recycled item, appending it at the end of
    /// its status bucket.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist, or a
    /// domain error when it is already active.
    pub async fn restore(&self, id: ItemId) -> BoardResult<Item> {
        let clock = Arc::clone(&self.clock);
        let stored = self
            .index
            .reinstate(id, move |item| item.restore(&*clock))
            .await?;
        self.notify(stored.container());
        Ok(stored)
    }

    /// Physically deletes a recycled item. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the item does not exist, or a
    /// domain error when it is not in the recycle bin.
    pub async fn purge(&self, id: ItemId) -> BoardResult<()> {
        let item = self.fetch(id).await?;
        self.index.discard(id, Item::ensure_can_purge).await?;
        self.notify(item.container());
        Ok(())
    }

    /// Restores every id in `ids`, collecting per-item outcomes.
    pub async fn bulk_restore(&self, ids: &[ItemId]) -> Vec<BulkOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = self.restore(id).await.map(|_| ());
            outcomes.push(BulkOutcome { id, result });
        }
        outcomes
    }

    /// Purges every id in `ids`, collecting per-item outcomes.
    pub async fn bulk_purge(&self, ids: &[ItemId]) -> Vec<BulkOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = self.purge(id).await;
            outcomes.push(BulkOutcome { id, result });
        }
        outcomes
    }

    /// Purges every recycled item of a container, regardless of age.
    ///
    /// # Errors
    ///
    /// Returns a store error when the bin listing itself fails; per-item
    /// purge failures are collected in the outcome list instead.
    pub async fn empty_bin(&self, container: &ContainerKey) -> BoardResult<Vec<BulkOutcome>> {
        let recycled: Vec<ItemId> = self
            .store
            .list_container(container)
            .await?
            .iter()
            .filter(|item| item.lifecycle_state() == LifecycleState::Recycled)
            .map(Item::id)
            .collect();
        Ok(self.bulk_purge(&recycled).await)
    }

    async fn fetch(&self, id: ItemId) -> BoardResult<Item> {
        self.store
            .get(id)
            .await?
            .ok_or(BoardError::NotFound(id))
    }

    fn notify(&self, container: &ContainerKey) {
        self.notifier.invalidate(container);
    }
}

fn ensure_active(item: &Item) -> BoardResult<()> {
    if item.is_active() {
        return Ok(());
    }
    Err(BoardError::Domain(BoardDomainError::NotActive {
        state: item.lifecycle_state(),
    }))
}
