//! Diesel schema for file records.

diesel::table! {
    /// Uploaded attachments and photo renditions.
    files (id) {
        id -> Uuid,
        #[max_length = 20]
        owner_type -> Varchar,
        owner_id -> Uuid,
        #[max_length = 50]
        name -> Varchar,
        #[max_length = 250]
        object_name -> Varchar,
        size -> Int8,
        img_resized -> Bool,
        img_width -> Int4,
        img_height -> Int4,
        #[max_length = 10]
        ext -> Varchar,
        mime_type -> Varchar,
        bucket_name -> Varchar,
        endpoint -> Varchar,
        created_by -> Uuid,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
        to_deleted_at -> Nullable<Timestamptz>,
    }
}
