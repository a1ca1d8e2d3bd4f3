//! Diesel row models for board item persistence.

use super::schema::items;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for item records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemRow {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// Tenant segment of the container key.
    pub tenant: String,
    /// Board category segment of the container key.
    pub category: String,
    /// Item kind discriminant.
    pub kind: String,
    /// Status column.
    pub status: String,
    /// Bucket slot; null for archived and recycled items.
    pub position: Option<i32>,
    /// Retention lifecycle state.
    pub lifecycle_state: String,
    /// Item title.
    pub title: String,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
    /// Recycle timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert/update model for item records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = items)]
#[diesel(treat_none_as_null = true)]
pub struct UpsertItemRow {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// Tenant segment of the container key.
    pub tenant: String,
    /// Board category segment of the container key.
    pub category: String,
    /// Item kind discriminant.
    pub kind: String,
    /// Status column.
    pub status: String,
    /// Bucket slot; null for archived and recycled items.
    pub position: Option<i32>,
    /// Retention lifecycle state.
    pub lifecycle_state: String,
    /// Item title.
    pub title: String,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
    /// Recycle timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}
