//! Drag-end translation into position index calls.

use super::{BoardError, BoardResult, PositionIndex};
use crate::board::domain::{BoardDomainError, BucketKey, Item, ItemId, Status};
use crate::board::ports::ItemStore;
use mockable::Clock;

/// What a dragged card was dropped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Dropped on a status column (possibly empty): append to that column.
    Column(Status),
    /// Dropped on another card: take that card's position.
    Item(ItemId),
}

/// Result of resolving a drag-end event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was persisted; the payload is the stored moved item.
    Applied(Item),
    /// The drop landed where the card already was; nothing was written.
    Noop,
}

/// Translates drag-end events into a single [`PositionIndex`] call.
///
/// Resolution runs against the caller's snapshot of the board (the view the
/// drag happened in); persistence runs against the authoritative store,
/// which recomputes against fresh state under the bucket version guard.
pub struct MoveResolver<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    index: PositionIndex<S, C>,
}

impl<S, C> MoveResolver<S, C>
where
    S: ItemStore,
    C: Clock + Send + Sync,
{
    /// Creates a resolver dispatching to `index`.
    #[must_use]
    pub const fn new(index: PositionIndex<S, C>) -> Self {
        Self { index }
    }

    /// Resolves a drag-end event and persists the resulting move.
    ///
    /// Drops that land on the card's current placement skip persistence and
    /// return [`MoveOutcome::Noop`]. A drop target missing from the
    /// snapshot (stale client view) falls back to appending at the end of
    /// the moved card's own column rather than failing the gesture.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when the moved item is absent from
    /// the snapshot, [`BoardError::Domain`] when it is off the board or the
    /// target column belongs to another kind.
    pub async fn resolve(
        &self,
        moved_id: ItemId,
        over: DropTarget,
        snapshot: &[Item],
    ) -> BoardResult<MoveOutcome> {
        let moved = snapshot
            .iter()
            .find(|item| item.id() == moved_id)
            .ok_or(BoardError::NotFound(moved_id))?;
        if !moved.is_active() {
            return Err(BoardError::Domain(BoardDomainError::NotActive {
                state: moved.lifecycle_state(),
            }));
        }

        let placement = resolve_target(moved, over, snapshot)?;
        let current_bucket = moved.bucket();
        if placement.bucket == current_bucket
            && Some(placement.index) == index_within(snapshot, &current_bucket, moved_id)
        {
            return Ok(MoveOutcome::Noop);
        }

        let to_position = u32::try_from(placement.index).unwrap_or(u32::MAX);
        let stored = self
            .index
            .move_item(moved_id, placement.bucket.status(), Some(to_position))
            .await?;
        Ok(MoveOutcome::Applied(stored))
    }
}

/// A resolved drop placement: target bucket and final index within it.
struct Placement {
    bucket: BucketKey,
    index: usize,
}

fn resolve_target(
    moved: &Item,
    over: DropTarget,
    snapshot: &[Item],
) -> Result<Placement, BoardError> {
    match over {
        DropTarget::Column(status) => {
            status.ensure_kind(moved.kind())?;
            let bucket = BucketKey::new(moved.container().clone(), status);
            Ok(append_placement(moved, bucket, snapshot))
        }
        DropTarget::Item(over_id) => {
            let over_item = snapshot
                .iter()
                .find(|item| item.id() == over_id && item.is_active());
            over_item.map_or_else(
                // Stale client view: the drop target is gone. Keep the UI
                // responsive by appending to the card's own column.
                || Ok(append_placement(moved, moved.bucket(), snapshot)),
                |target| {
                    let bucket = target.bucket();
                    let index =
                        index_within(snapshot, &bucket, over_id).unwrap_or_else(|| {
                            bucket_items(snapshot, &bucket).count()
                        });
                    Ok(Placement { bucket, index })
                },
            )
        }
    }
}

/// Placement for an append: last slot of the moved card's target column.
fn append_placement(moved: &Item, bucket: BucketKey, snapshot: &[Item]) -> Placement {
    let others = bucket_items(snapshot, &bucket)
        .filter(|item| item.id() != moved.id())
        .count();
    Placement {
        bucket,
        index: others,
    }
}

/// Active items of one bucket within the snapshot.
fn bucket_items<'a>(
    snapshot: &'a [Item],
    bucket: &'a BucketKey,
) -> impl Iterator<Item = &'a Item> {
    snapshot
        .iter()
        .filter(move |item| item.is_active() && item.bucket() == *bucket)
}

/// Index of `id` within its bucket's position-sorted list, ties broken by
/// stored position ascending.
fn index_within(snapshot: &[Item], bucket: &BucketKey, id: ItemId) -> Option<usize> {
    let mut members: Vec<&Item> = bucket_items(snapshot, bucket).collect();
    members.sort_by_key(|item| item.position());
    members.iter().position(|item| item.id() == id)
}
