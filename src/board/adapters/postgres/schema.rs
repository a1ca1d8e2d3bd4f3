//! Diesel schema for board item persistence.

diesel::table! {
    /// Board item records across all lifecycle states.
    items (id) {
        /// Item identifier.
        id -> Uuid,
        /// Tenant segment of the container key.
        #[max_length = 255]
        tenant -> Varchar,
        /// Board category segment of the container key.
        #[max_length = 255]
        category -> Varchar,
        /// Item kind discriminant.
        #[max_length = 50]
        kind -> Varchar,
        /// Status column.
        #[max_length = 50]
        status -> Varchar,
        /// Bucket slot; null for archived and recycled items.
        position -> Nullable<Int4>,
        /// Retention lifecycle state.
        #[max_length = 50]
        lifecycle_state -> Varchar,
        /// Item title.
        title -> Varchar,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Archival timestamp.
        archived_at -> Nullable<Timestamptz>,
        /// Recycle timestamp.
        deleted_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-bucket version counters for compare-and-swap serialization.
    buckets (tenant, category, kind, status) {
        /// Tenant segment of the container key.
        #[max_length = 255]
        tenant -> Varchar,
        /// Board category segment of the container key.
        #[max_length = 255]
        category -> Varchar,
        /// Item kind discriminant.
        #[max_length = 50]
        kind -> Varchar,
        /// Status column.
        #[max_length = 50]
        status -> Varchar,
        /// Version counter, bumped by every committed bucket write.
        version -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(items, buckets);
