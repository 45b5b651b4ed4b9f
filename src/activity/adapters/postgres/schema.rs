//! Diesel schema for the activity journal.

diesel::table! {
    /// Append-only task activities.
    activities (id) {
        id -> Uuid,
        /// Insertion sequence breaking `created_at` ties.
        seq -> Int8,
        entity_uuid -> Uuid,
        #[max_length = 20]
        entity_type -> Varchar,
        created_by_uuid -> Uuid,
        created_by -> Varchar,
        created_at -> Timestamptz,
        /// Numeric activity type code.
        kind -> Int4,
        meta -> Jsonb,
    }
}
