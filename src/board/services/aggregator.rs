//! Read-side board views.

use super::BoardResult;
use crate::board::domain::{BucketKey, ContainerKey, Item, LifecycleState, Status};
use crate::board::ports::ItemStore;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Width of [`ArchiveWindow::LastThirtyDays`], in days.
const THIRTY_DAYS: i64 = 30;

/// Width of [`ArchiveWindow::LastSixMonths`], in days. Half of the
/// twelve-month window, rounded up.
const SIX_MONTHS_DAYS: i64 = TWELVE_MONTHS_DAYS / 2 + 1;

/// Width of [`ArchiveWindow::LastTwelveMonths`], in days; ages beyond it
/// fall under [`ArchiveWindow::Older`].
const TWELVE_MONTHS_DAYS: i64 = 365;

/// Age window for browsing archived items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveWindow {
    /// Archived within the last thirty days.
    LastThirtyDays,
    /// Archived within the last six months.
    LastSixMonths,
    /// Archived within the last twelve months.
    LastTwelveMonths,
    /// Archived more than twelve months ago.
    Older,
}

impl ArchiveWindow {
    /// Returns whether an item archived at `archived_at` falls in the
    /// window as of `now`.
    #[must_use]
    pub fn contains(self, archived_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(archived_at);
        match self {
            Self::LastThirtyDays => age <= Duration::days(THIRTY_DAYS),
            Self::LastSixMonths => age <= Duration::days(SIX_MONTHS_DAYS),
            Self::LastTwelveMonths => age <= Duration::days(TWELVE_MONTHS_DAYS),
            Self::Older => age > Duration::days(TWELVE_MONTHS_DAYS),
        }
    }
}

/// Composes the position index and lifecycle fields into the views
/// consumers read.
///
/// Pure read composition: the aggregator never mutates position or
/// lifecycle fields, and it propagates store errors unchanged.
pub struct BoardAggregator<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for BoardAggregator<S, C>
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

impl<S, C> BoardAggregator<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    /// Creates a new aggregator over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Returns the active items of one status column, position ascending.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub async fn list_by_status(
        &self,
        container: &ContainerKey,
        status: Status,
    ) -> BoardResult<Vec<Item>> {
        let bucket = BucketKey::new(container.clone(), status);
        let snapshot = self.store.load_bucket(&bucket).await?;
        Ok(snapshot.items)
    }

    /// Returns the archived items of a container within `window`, most
    /// recently archived first.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub async fn list_archived(
        &self,
        container: &ContainerKey,
        window: ArchiveWindow,
    ) -> BoardResult<Vec<Item>> {
        let now = self.clock.utc();
        let mut archived: Vec<Item> = self
            .store
            .list_container(container)
            .await?
            .into_iter()
            .filter(|item| item.lifecycle_state() == LifecycleState::Archived)
            .filter(|item| {
                item.archived_at()
                    .is_some_and(|at| window.contains(at, now))
            })
            .collect();
        archived.sort_by_key(|item| std::cmp::Reverse(item.archived_at()));
        Ok(archived)
    }

    /// Returns the recycled items of a container, most recently deleted
    /// first.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub async fn list_recycled(&self, container: &ContainerKey) -> BoardResult<Vec<Item>> {
        let mut recycled: Vec<Item> = self
            .store
            .list_container(container)
            .await?
            .into_iter()
            .filter(|item| item.lifecycle_state() == LifecycleState::Recycled)
            .collect();
        recycled.sort_by_key(|item| std::cmp::Reverse(item.deleted_at()));
        Ok(recycled)
    }
}
