//! Shared fixtures and test doubles for board tests.

use crate::board::adapters::memory::InMemoryItemStore;
use crate::board::domain::{BucketKey, ContainerKey, Item, ItemId, ItemKind};
use crate::board::ports::{
    BucketSnapshot, ChangeNotifier, ChangeSet, ItemStore, ItemStoreError, ItemStoreResult,
};
use crate::board::services::LifecycleService;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Deterministic clock that only moves when a test advances it.
pub(super) struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("clock lock");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock")
    }
}

/// Notifier counting invalidation signals per test run.
#[derive(Debug, Default)]
pub(super) struct CountingNotifier {
    signals: AtomicUsize,
}

impl CountingNotifier {
    pub(super) fn signals(&self) -> usize {
        self.signals.load(Ordering::SeqCst)
    }
}

impl ChangeNotifier for CountingNotifier {
    fn invalidate(&self, _container: &ContainerKey) {
        self.signals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store wrapper that fails the next `conflicts` commits with a version
/// conflict before delegating, for exercising the retry path.
pub(super) struct ContendedStore {
    inner: InMemoryItemStore,
    conflicts: AtomicU32,
}

impl ContendedStore {
    pub(super) fn failing(inner: InMemoryItemStore, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

#[async_trait]
impl ItemStore for ContendedStore {
    async fn get(&self, id: ItemId) -> ItemStoreResult<Option<Item>> {
        self.inner.get(id).await
    }

    async fn load_bucket(&self, bucket: &BucketKey) -> ItemStoreResult<BucketSnapshot> {
        self.inner.load_bucket(bucket).await
    }

    async fn list_container(&self, container: &ContainerKey) -> ItemStoreResult<Vec<Item>> {
        self.inner.list_container(container).await
    }

    async fn commit(&self, changes: ChangeSet) -> ItemStoreResult<()> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            if let Some((bucket, _)) = changes.expectations().first() {
                return Err(ItemStoreError::VersionConflict(bucket.clone()));
            }
        }
        self.inner.commit(changes).await
    }
}

pub(super) type RivalWrite = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Store wrapper that awaits a one-shot rival write just before delegating
/// the first commit, squeezing another writer into the window between an
/// operation's reads and its commit.
pub(super) struct InterposingStore {
    inner: InMemoryItemStore,
    rival: Mutex<Option<RivalWrite>>,
}

impl InterposingStore {
    pub(super) fn racing(inner: InMemoryItemStore, rival: RivalWrite) -> Self {
        Self {
            inner,
            rival: Mutex::new(Some(rival)),
        }
    }
}

#[async_trait]
impl ItemStore for InterposingStore {
    async fn get(&self, id: ItemId) -> ItemStoreResult<Option<Item>> {
        self.inner.get(id).await
    }

    async fn load_bucket(&self, bucket: &BucketKey) -> ItemStoreResult<BucketSnapshot> {
        self.inner.load_bucket(bucket).await
    }

    async fn list_container(&self, container: &ContainerKey) -> ItemStoreResult<Vec<Item>> {
        self.inner.list_container(container).await
    }

    async fn commit(&self, changes: ChangeSet) -> ItemStoreResult<()> {
        let pending = { self.rival.lock().expect("rival lock").take() };
        if let Some(pending) = pending {
            pending.await;
        }
        self.inner.commit(changes).await
    }
}

pub(super) fn moment() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn container() -> ContainerKey {
    ContainerKey::new("acme", "work").expect("valid container key")
}

pub(super) type TestLifecycle =
    LifecycleService<InMemoryItemStore, FixedClock, CountingNotifier>;

/// One store, one clock, one lifecycle service, wired the way embedders
/// wire them.
pub(super) struct Harness {
    pub(super) store: Arc<InMemoryItemStore>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) notifier: Arc<CountingNotifier>,
    pub(super) lifecycle: TestLifecycle,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::at(moment())
    }

    pub(super) fn at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(InMemoryItemStore::new());
        let clock = Arc::new(FixedClock::at(now));
        let notifier = Arc::new(CountingNotifier::default());
        let lifecycle = LifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&notifier),
        );
        Self {
            store,
            clock,
            notifier,
            lifecycle,
        }
    }

    /// Creates `count` items in the initial column, titled `t0..t{n-1}`.
    pub(super) async fn seed(&self, kind: ItemKind, count: usize) -> Vec<Item> {
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            let item = self
                .lifecycle
                .create(container(), kind, format!("t{index}"))
                .await
                .expect("seed item");
            items.push(item);
        }
        items
    }
}

/// Positions of `items`, in the order given.
pub(super) fn positions(items: &[Item]) -> Vec<Option<u32>> {
    items.iter().map(Item::position).collect()
}

/// Titles of `items`, in the order given.
pub(super) fn titles(items: &[Item]) -> Vec<&str> {
    items.iter().map(Item::title).collect()
}
