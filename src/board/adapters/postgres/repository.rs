//! `PostgreSQL` item store implementation.

use super::{
    models::{ItemRow, UpsertItemRow},
    schema::{buckets, items},
};
use crate::board::domain::{
    BucketKey, ContainerKey, Item, ItemId, LifecycleState, PersistedItemData, Status,
};
use crate::board::ports::{
    BucketSnapshot, ChangeSet, ItemStore, ItemStoreError, ItemStoreResult,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed item store.
///
/// Bucket writes are serialized through the `buckets` version table: each
/// commit compare-and-swaps every expected version inside one transaction,
/// so a stale writer rolls back wholesale with a version conflict.
#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: BoardPgPool,
}

impl PostgresItemStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ItemStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ItemStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ItemStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ItemStoreError::persistence)?
    }
}

impl From<DieselError> for ItemStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn get(&self, id: ItemId) -> ItemStoreResult<Option<Item>> {
        self.run_blocking(move |connection| {
            let row = items::table
                .filter(items::id.eq(id.into_inner()))
                .select(ItemRow::as_select())
                .first::<ItemRow>(connection)
                .optional()
                .map_err(ItemStoreError::persistence)?;
            row.map(row_to_item).transpose()
        })
        .await
    }

    async fn load_bucket(&self, bucket: &BucketKey) -> ItemStoreResult<BucketSnapshot> {
        let lookup = bucket.clone();
        self.run_blocking(move |connection| {
            let stored_version = buckets::table
                .find(bucket_pk(&lookup))
                .select(buckets::version)
                .first::<i64>(connection)
                .optional()
                .map_err(ItemStoreError::persistence)?
                .unwrap_or(0);
            let version = u64::try_from(stored_version).map_err(ItemStoreError::persistence)?;

            let rows = items::table
                .filter(items::tenant.eq(lookup.container().tenant()))
                .filter(items::category.eq(lookup.container().category()))
                .filter(items::kind.eq(lookup.status().kind().as_str()))
                .filter(items::status.eq(lookup.status().as_str()))
                .filter(items::lifecycle_state.eq(LifecycleState::Active.as_str()))
                .order((items::position.asc(), items::created_at.asc()))
                .select(ItemRow::as_select())
                .load::<ItemRow>(connection)
                .map_err(ItemStoreError::persistence)?;

            let loaded: ItemStoreResult<Vec<Item>> = rows.into_iter().map(row_to_item).collect();
            Ok(BucketSnapshot {
                bucket: lookup,
                version,
                items: loaded?,
            })
        })
        .await
    }

    async fn list_container(&self, container: &ContainerKey) -> ItemStoreResult<Vec<Item>> {
        let lookup = container.clone();
        self.run_blocking(move |connection| {
            let rows = items::table
                .filter(items::tenant.eq(lookup.tenant()))
                .filter(items::category.eq(lookup.category()))
                .order(items::created_at.asc())
                .select(ItemRow::as_select())
                .load::<ItemRow>(connection)
                .map_err(ItemStoreError::persistence)?;
            rows.into_iter().map(row_to_item).collect()
        })
        .await
    }

    async fn commit(&self, changes: ChangeSet) -> ItemStoreResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ItemStoreError, _>(|transaction| {
                for (bucket, expected) in changes.expectations() {
                    cas_bucket_version(transaction, bucket, *expected)?;
                }
                for id in changes.deletes() {
                    let affected =
                        diesel::delete(items::table.filter(items::id.eq(id.into_inner())))
                            .execute(transaction)?;
                    if affected == 0 {
                        return Err(ItemStoreError::NotFound(*id));
                    }
                }
                for item in changes.upserts() {
                    let row = item_to_row(item)?;
                    diesel::insert_into(items::table)
                        .values(&row)
                        .on_conflict(items::id)
                        .do_update()
                        .set(&row)
                        .execute(transaction)?;
                }
                Ok(())
            })
        })
        .await
    }
}

/// Compare-and-swaps one bucket version, creating the counter row on the
/// bucket's first write.
fn cas_bucket_version(
    connection: &mut PgConnection,
    bucket: &BucketKey,
    expected: u64,
) -> ItemStoreResult<()> {
    let expected_version = i64::try_from(expected).map_err(ItemStoreError::persistence)?;
    let next_version = expected_version
        .checked_add(1)
        .ok_or_else(|| ItemStoreError::persistence(std::io::Error::other("version overflow")))?;

    let updated = diesel::update(
        buckets::table
            .find(bucket_pk(bucket))
            .filter(buckets::version.eq(expected_version)),
    )
    .set(buckets::version.eq(next_version))
    .execute(connection)?;
    if updated == 1 {
        return Ok(());
    }

    if expected == 0 {
        let inserted = diesel::insert_into(buckets::table)
            .values((
                buckets::tenant.eq(bucket.container().tenant()),
                buckets::category.eq(bucket.container().category()),
                buckets::kind.eq(bucket.status().kind().as_str()),
                buckets::status.eq(bucket.status().as_str()),
                buckets::version.eq(1_i64),
            ))
            .on_conflict_do_nothing()
            .execute(connection)?;
        if inserted == 1 {
            return Ok(());
        }
    }
    Err(ItemStoreError::VersionConflict(bucket.clone()))
}

type BucketPk<'a> = (&'a str, &'a str, &'a str, &'a str);

fn bucket_pk(bucket: &BucketKey) -> BucketPk<'_> {
    (
        bucket.container().tenant(),
        bucket.container().category(),
        bucket.status().kind().as_str(),
        bucket.status().as_str(),
    )
}

fn item_to_row(item: &Item) -> ItemStoreResult<UpsertItemRow> {
    let position = item
        .position()
        .map(i32::try_from)
        .transpose()
        .map_err(ItemStoreError::persistence)?;

    Ok(UpsertItemRow {
        id: item.id().into_inner(),
        tenant: item.container().tenant().to_owned(),
        category: item.container().category().to_owned(),
        kind: item.kind().as_str().to_owned(),
        status: item.status().as_str().to_owned(),
        position,
        lifecycle_state: item.lifecycle_state().as_str().to_owned(),
        title: item.title().to_owned(),
        completed_at: item.completed_at(),
        archived_at: item.archived_at(),
        deleted_at: item.deleted_at(),
        created_at: item.created_at(),
        updated_at: item.updated_at(),
    })
}

fn row_to_item(row: ItemRow) -> ItemStoreResult<Item> {
    let ItemRow {
        id,
        tenant,
        category,
        kind,
        status: persisted_status,
        position,
        lifecycle_state: persisted_lifecycle,
        title,
        completed_at,
        archived_at,
        deleted_at,
        created_at,
        updated_at,
    } = row;

    let container = ContainerKey::new(tenant, category).map_err(ItemStoreError::persistence)?;
    let status =
        Status::from_parts(&kind, &persisted_status).map_err(ItemStoreError::persistence)?;
    let lifecycle_state = LifecycleState::try_from(persisted_lifecycle.as_str())
        .map_err(ItemStoreError::persistence)?;
    let slot = position
        .map(u32::try_from)
        .transpose()
        .map_err(ItemStoreError::persistence)?;

    let data = PersistedItemData {
        id: ItemId::from_uuid(id),
        container,
        title,
        status,
        position: slot,
        lifecycle_state,
        completed_at,
        archived_at,
        deleted_at,
        created_at,
        updated_at,
    };
    Ok(Item::from_persisted(data))
}
