//! Opportunistic retention sweeps.

use super::{BoardError, BoardResult, BulkOutcome, LifecycleService};
use crate::board::domain::{
    BoardDomainError, ContainerKey, Item, ItemId, LifecycleState, RetentionPolicy,
};
use crate::board::ports::{ChangeNotifier, ItemStore};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;

/// What one sweep pass did to a container.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Items auto-archived because their grace period elapsed.
    pub archived: Vec<ItemId>,
    /// Items purged because their bin window elapsed.
    pub purged: Vec<ItemId>,
    /// Per-item failures; the sweep continues past them.
    pub failed: Vec<BulkOutcome>,
}

/// Applies the time-gated lifecycle transitions.
///
/// There is no durable scheduler process: consumers trigger `sweep`
/// opportunistically (typically on board load). The sweep is idempotent and
/// safe to invoke redundantly from concurrent sessions; the lifecycle
/// guards deduplicate, so an item another session already swept is simply
/// skipped.
pub struct RetentionSweeper<S, C, N>
where
    S: ItemStore,
    C: Clock + Send + Sync,
    N: ChangeNotifier,
{
    store: Arc<S>,
    clock: Arc<C>,
    policy: RetentionPolicy,
    lifecycle: LifecycleService<S, C, N>,
}

impl<S, C, N> RetentionSweeper<S, C, N>
where
    S: ItemStore,
    C: Clock + Send + Sync,
    N: ChangeNotifier,
{
    /// Creates a sweeper enforcing `policy`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, notifier: Arc<N>, policy: RetentionPolicy) -> Self {
        let lifecycle = LifecycleService::new(Arc::clone(&store), Arc::clone(&clock), notifier);
        Self {
            store,
            clock,
            policy,
            lifecycle,
        }
    }

    /// Returns the enforced policy.
    #[must_use]
    pub const fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Sweeps one container: archives finished items past their grace
    /// period and purges recycled items past the bin window.
    ///
    /// Archived items are never purged by the sweep; they persist until an
    /// explicit user action moves them on.
    ///
    /// # Errors
    ///
    /// Returns a store error when the container listing itself fails;
    /// per-item transition failures land in the report instead.
    pub async fn sweep(&self, container: &ContainerKey) -> BoardResult<SweepReport> {
        let now = self.clock.utc();
        let items = self.store.list_container(container).await?;
        let mut report = SweepReport::default();

        for item in &items {
            if self.archive_is_due(item, now) {
                record(&mut report.archived, &mut report.failed, item, {
                    self.lifecycle.archive(item.id()).await.map(|_| ())
                });
            } else if self.purge_is_due(item, now) {
                record(&mut report.purged, &mut report.failed, item, {
                    self.lifecycle.purge(item.id()).await
                });
            }
        }

        tracing::debug!(
            container = %container,
            archived = report.archived.len(),
            purged = report.purged.len(),
            failed = report.failed.len(),
            "retention sweep finished"
        );
        Ok(report)
    }

    fn archive_is_due(&self, item: &Item, now: DateTime<Utc>) -> bool {
        item.lifecycle_state() == LifecycleState::Active
            && item.status().is_terminal()
            && item
                .completed_at()
                .is_some_and(|at| self.policy.archive_due(at, now))
    }

    fn purge_is_due(&self, item: &Item, now: DateTime<Utc>) -> bool {
        item.lifecycle_state() == LifecycleState::Recycled
            && item
                .deleted_at()
                .is_some_and(|at| self.policy.purge_due(at, now))
    }
}

/// Books one swept item into the report. Losing a race to a concurrent
/// sweep is expected under at-least-once invocation and counts as done.
fn record(
    done: &mut Vec<ItemId>,
    failed: &mut Vec<BulkOutcome>,
    item: &Item,
    result: BoardResult<()>,
) {
    match result {
        Ok(()) => done.push(item.id()),
        Err(
            BoardError::NotFound(_)
            | BoardError::Domain(BoardDomainError::InvalidLifecycleTransition { .. }),
        ) => {}
        Err(err) => failed.push(BulkOutcome {
            id: item.id(),
            result: Err(err),
        }),
    }
}
