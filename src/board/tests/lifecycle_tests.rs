//! Unit tests for lifecycle orchestration over the in-memory store.

use super::support::{
    CountingNotifier, FixedClock, Harness, InterposingStore, RivalWrite, container, moment,
    positions, titles,
};
use crate::board::adapters::memory::InMemoryItemStore;
use crate::board::domain::{
    BoardDomainError, BucketKey, Item, ItemId, ItemKind, LifecycleState, Status, TaskStatus,
};
use crate::board::ports::ItemStore;
use crate::board::services::{BoardError, LifecycleService};
use chrono::Duration;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

async fn bucket_order(harness: &Harness, status: Status) -> Vec<Item> {
    harness
        .store
        .load_bucket(&BucketKey::new(container(), status))
        .await
        .expect("bucket load")
        .items
}

async fn stored(harness: &Harness, id: ItemId) -> Item {
    harness
        .store
        .get(id)
        .await
        .expect("store read")
        .expect("item exists")
}

/// Plain service over `inner`, for seeding and for rival writers.
fn rival_session(
    inner: &InMemoryItemStore,
    clock: &Arc<FixedClock>,
) -> LifecycleService<InMemoryItemStore, FixedClock, CountingNotifier> {
    LifecycleService::new(
        Arc::new(inner.clone()),
        Arc::clone(clock),
        Arc::new(CountingNotifier::default()),
    )
}

/// Service whose store squeezes `rival` in just before its first commit.
fn racing_session(
    inner: &InMemoryItemStore,
    clock: &Arc<FixedClock>,
    rival: RivalWrite,
) -> LifecycleService<InterposingStore, FixedClock, CountingNotifier> {
    LifecycleService::new(
        Arc::new(InterposingStore::racing(inner.clone(), rival)),
        Arc::clone(clock),
        Arc::new(CountingNotifier::default()),
    )
}

async fn ordered(inner: &InMemoryItemStore, status: Status) -> Vec<Item> {
    inner
        .load_bucket(&BucketKey::new(container(), status))
        .await
        .expect("bucket load")
        .items
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_items_append_to_the_initial_column(harness: Harness) {
    let first = harness
        .lifecycle
        .create(container(), ItemKind::Task, "first")
        .await
        .expect("create");
    let second = harness
        .lifecycle
        .create(container(), ItemKind::Task, "second")
        .await
        .expect("create");

    assert_eq!(first.position(), Some(0));
    assert_eq!(second.position(), Some(1));
    assert_eq!(harness.notifier.signals(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn renaming_updates_title_and_timestamp(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;
    harness.clock.advance(Duration::minutes(5));

    let renamed = harness
        .lifecycle
        .rename(seeded[0].id(), "renamed")
        .await
        .expect("rename");

    assert_eq!(renamed.title(), "renamed");
    assert_eq!(renamed.updated_at(), moment() + Duration::minutes(5));
    assert_eq!(renamed.position(), seeded[0].position());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_moves_the_card_to_the_end_of_the_terminal_column(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 3).await;

    let completed = harness
        .lifecycle
        .complete(seeded[0].id())
        .await
        .expect("complete");

    assert_eq!(completed.status(), Status::Task(TaskStatus::Complete));
    assert_eq!(completed.position(), Some(0));
    assert_eq!(completed.completed_at(), Some(moment()));

    let source = bucket_order(&harness, Status::Task(TaskStatus::Todo)).await;
    assert_eq!(titles(&source), vec!["t1", "t2"]);
    assert_eq!(positions(&source), vec![Some(0), Some(1)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_twice_is_rejected(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;
    harness
        .lifecycle
        .complete(seeded[0].id())
        .await
        .expect("first completion");

    let result = harness.lifecycle.complete(seeded[0].id()).await;

    assert!(matches!(
        result,
        Err(BoardError::Domain(BoardDomainError::AlreadyCompleted { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopening_returns_the_card_to_the_initial_column(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 2).await;
    harness
        .lifecycle
        .complete(seeded[0].id())
        .await
        .expect("complete");

    let reopened = harness
        .lifecycle
        .reopen(seeded[0].id())
        .await
        .expect("reopen");

    assert_eq!(reopened.status(), Status::Task(TaskStatus::Todo));
    assert_eq!(reopened.completed_at(), None);
    // Reopened cards go to the back, not their old slot.
    assert_eq!(reopened.position(), Some(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archiving_removes_the_card_and_closes_the_gap(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 3).await;
    for item in &seeded {
        harness
            .lifecycle
            .complete(item.id())
            .await
            .expect("complete");
    }

    let archived = harness
        .lifecycle
        .archive(seeded[1].id())
        .await
        .expect("archive");

    assert_eq!(archived.lifecycle_state(), LifecycleState::Archived);
    assert_eq!(archived.position(), None);
    assert_eq!(archived.archived_at(), Some(moment()));

    let terminal = bucket_order(&harness, Status::Task(TaskStatus::Complete)).await;
    assert_eq!(titles(&terminal), vec!["t0", "t2"]);
    assert_eq!(positions(&terminal), vec![Some(0), Some(1)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archiving_an_unfinished_card_is_rejected(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;

    let result = harness.lifecycle.archive(seeded[0].id()).await;

    assert!(matches!(
        result,
        Err(BoardError::Domain(
            BoardDomainError::ArchiveRequiresTerminalStatus { .. }
        ))
    ));
    let untouched = stored(&harness, seeded[0].id()).await;
    assert_eq!(untouched.lifecycle_state(), LifecycleState::Active);
    assert_eq!(untouched.position(), Some(0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recycling_an_active_card_closes_the_gap(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 3).await;

    let recycled = harness
        .lifecycle
        .recycle(seeded[0].id())
        .await
        .expect("recycle");

    assert_eq!(recycled.lifecycle_state(), LifecycleState::Recycled);
    assert_eq!(recycled.position(), None);
    assert_eq!(recycled.deleted_at(), Some(moment()));

    let remaining = bucket_order(&harness, Status::Task(TaskStatus::Todo)).await;
    assert_eq!(titles(&remaining), vec!["t1", "t2"]);
    assert_eq!(positions(&remaining), vec![Some(0), Some(1)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recycling_an_archived_card_skips_bucket_surgery(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;
    harness
        .lifecycle
        .complete(seeded[0].id())
        .await
        .expect("complete");
    harness
        .lifecycle
        .archive(seeded[0].id())
        .await
        .expect("archive");

    let recycled = harness
        .lifecycle
        .recycle(seeded[0].id())
        .await
        .expect("recycle");

    assert_eq!(recycled.lifecycle_state(), LifecycleState::Recycled);
    assert_eq!(recycled.archived_at(), None);
    assert_eq!(recycled.deleted_at(), Some(moment()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restoring_appends_to_the_card_status_bucket(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 3).await;
    harness
        .lifecycle
        .recycle(seeded[0].id())
        .await
        .expect("recycle");

    let restored = harness
        .lifecycle
        .restore(seeded[0].id())
        .await
        .expect("restore");

    assert_eq!(restored.lifecycle_state(), LifecycleState::Active);
    assert_eq!(restored.deleted_at(), None);
    assert_eq!(restored.position(), Some(2));

    let ordered = bucket_order(&harness, Status::Task(TaskStatus::Todo)).await;
    assert_eq!(titles(&ordered), vec!["t1", "t2", "t0"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restoring_a_completed_card_returns_it_to_the_terminal_column(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;
    harness
        .lifecycle
        .complete(seeded[0].id())
        .await
        .expect("complete");
    harness
        .lifecycle
        .archive(seeded[0].id())
        .await
        .expect("archive");

    let restored = harness
        .lifecycle
        .restore(seeded[0].id())
        .await
        .expect("restore");

    assert_eq!(restored.status(), Status::Task(TaskStatus::Complete));
    assert_eq!(restored.position(), Some(0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn purging_deletes_the_record_for_good(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;
    harness
        .lifecycle
        .recycle(seeded[0].id())
        .await
        .expect("recycle");

    harness.lifecycle.purge(seeded[0].id()).await.expect("purge");

    let gone = harness
        .store
        .get(seeded[0].id())
        .await
        .expect("store read");
    assert_eq!(gone, None);
    let result = harness.lifecycle.restore(seeded[0].id()).await;
    assert!(matches!(result, Err(BoardError::NotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn purging_an_active_card_is_rejected(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 1).await;

    let result = harness.lifecycle.purge(seeded[0].id()).await;

    assert!(matches!(
        result,
        Err(BoardError::Domain(
            BoardDomainError::InvalidLifecycleTransition { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bulk_restore_continues_past_failures(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 2).await;
    harness
        .lifecycle
        .recycle(seeded[0].id())
        .await
        .expect("recycle");
    let missing = ItemId::new();

    let outcomes = harness
        .lifecycle
        .bulk_restore(&[seeded[0].id(), missing, seeded[1].id()])
        .await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].result.is_ok());
    assert!(matches!(outcomes[1].result, Err(BoardError::NotFound(_))));
    // Restoring an already-active card fails its entry only.
    assert!(outcomes[2].result.is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn emptying_the_bin_purges_recycled_cards_of_any_age(harness: Harness) {
    let seeded = harness.seed(ItemKind::Task, 3).await;
    harness
        .lifecycle
        .recycle(seeded[0].id())
        .await
        .expect("recycle");
    harness
        .lifecycle
        .recycle(seeded[1].id())
        .await
        .expect("recycle");

    let outcomes = harness
        .lifecycle
        .empty_bin(&container())
        .await
        .expect("empty bin");

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|outcome| outcome.result.is_ok()));
    let survivor = stored(&harness, seeded[2].id()).await;
    assert_eq!(survivor.lifecycle_state(), LifecycleState::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recycling_retries_over_a_concurrent_move_instead_of_clobbering_it() {
    let inner = InMemoryItemStore::new();
    let clock = Arc::new(FixedClock::at(moment()));
    let session = rival_session(&inner, &clock);
    let card = session
        .create(container(), ItemKind::Task, "card")
        .await
        .expect("create");
    let neighbour = session
        .create(container(), ItemKind::Task, "neighbour")
        .await
        .expect("create");
    session.complete(neighbour.id()).await.expect("complete");

    let mover = session.index().clone();
    let card_id = card.id();
    let rival: RivalWrite = Box::pin(async move {
        mover
            .move_item(card_id, Status::Task(TaskStatus::Complete), Some(0))
            .await
            .expect("rival move");
    });
    let racing = racing_session(&inner, &clock, rival);

    let recycled = racing.recycle(card_id).await.expect("recycle");

    // The recycle landed on the card where the rival move put it.
    assert_eq!(recycled.status(), Status::Task(TaskStatus::Complete));
    assert_eq!(recycled.lifecycle_state(), LifecycleState::Recycled);
    assert_eq!(recycled.position(), None);

    let terminal = ordered(&inner, Status::Task(TaskStatus::Complete)).await;
    assert_eq!(titles(&terminal), vec!["neighbour"]);
    assert_eq!(positions(&terminal), vec![Some(0)]);
    let initial = ordered(&inner, Status::Task(TaskStatus::Todo)).await;
    assert!(initial.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archiving_surfaces_a_concurrent_reopen_instead_of_overwriting_it() {
    let inner = InMemoryItemStore::new();
    let clock = Arc::new(FixedClock::at(moment()));
    let session = rival_session(&inner, &clock);
    let card = session
        .create(container(), ItemKind::Task, "card")
        .await
        .expect("create");
    session
        .create(container(), ItemKind::Task, "other")
        .await
        .expect("create");
    session.complete(card.id()).await.expect("complete");

    let mover = session.index().clone();
    let card_id = card.id();
    let rival: RivalWrite = Box::pin(async move {
        mover
            .move_item(card_id, Status::Task(TaskStatus::Todo), Some(0))
            .await
            .expect("rival move");
    });
    let racing = racing_session(&inner, &clock, rival);

    let result = racing.archive(card_id).await;

    assert!(matches!(
        result,
        Err(BoardError::Domain(
            BoardDomainError::ArchiveRequiresTerminalStatus { .. }
        ))
    ));
    let board = ordered(&inner, Status::Task(TaskStatus::Todo)).await;
    assert_eq!(titles(&board), vec!["card", "other"]);
    assert_eq!(positions(&board), vec![Some(0), Some(1)]);
    let current = inner
        .get(card_id)
        .await
        .expect("store read")
        .expect("card exists");
    assert_eq!(current.lifecycle_state(), LifecycleState::Active);
    assert_eq!(current.completed_at(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restoring_cannot_resurrect_a_concurrently_purged_card() {
    let inner = InMemoryItemStore::new();
    let clock = Arc::new(FixedClock::at(moment()));
    let session = rival_session(&inner, &clock);
    let card = session
        .create(container(), ItemKind::Task, "card")
        .await
        .expect("create");
    session.recycle(card.id()).await.expect("recycle");

    let cleaner = rival_session(&inner, &clock);
    let card_id = card.id();
    let rival: RivalWrite = Box::pin(async move {
        cleaner.purge(card_id).await.expect("rival purge");
    });
    let racing = racing_session(&inner, &clock, rival);

    let result = racing.restore(card_id).await;

    assert!(matches!(result, Err(BoardError::NotFound(_))));
    let gone = inner.get(card_id).await.expect("store read");
    assert_eq!(gone, None);
    let board = ordered(&inner, Status::Task(TaskStatus::Todo)).await;
    assert!(board.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn renaming_preserves_slots_across_a_concurrent_reorder() {
    let inner = InMemoryItemStore::new();
    let clock = Arc::new(FixedClock::at(moment()));
    let session = rival_session(&inner, &clock);
    let mut cards = Vec::new();
    for title in ["t0", "t1", "t2"] {
        let card = session
            .create(container(), ItemKind::Task, title)
            .await
            .expect("create");
        cards.push(card);
    }

    let mover = session.index().clone();
    let last_id = cards[2].id();
    let rival: RivalWrite = Box::pin(async move {
        mover
            .move_item(last_id, Status::Task(TaskStatus::Todo), Some(0))
            .await
            .expect("rival reorder");
    });
    let racing = racing_session(&inner, &clock, rival);

    let renamed = racing.rename(cards[0].id(), "renamed").await.expect("rename");

    // The rename carries the slot the reorder assigned, not its own stale
    // read, so no two cards share a position.
    assert_eq!(renamed.position(), Some(1));
    let board = ordered(&inner, Status::Task(TaskStatus::Todo)).await;
    assert_eq!(titles(&board), vec!["t2", "renamed", "t1"]);
    assert_eq!(positions(&board), vec![Some(0), Some(1), Some(2)]);
}
