//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Task records. Indexed attributes are columns; the full aggregate
    /// snapshot lives in `data`.
    tasks (id) {
        id -> Uuid,
        /// Sequence-assigned task number.
        number -> Int8,
        federation_id -> Uuid,
        company_id -> Uuid,
        project_id -> Uuid,
        #[max_length = 100]
        name -> Varchar,
        status -> Int4,
        /// Ancestry ending with the task itself.
        path -> Array<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        activity_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
        /// Serialized task snapshot.
        data -> Jsonb,
    }
}

diesel::table! {
    /// Project snapshots read by the task lifecycle.
    projects (id) {
        id -> Uuid,
        federation_id -> Uuid,
        company_id -> Uuid,
        snapshot -> Jsonb,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, projects);
