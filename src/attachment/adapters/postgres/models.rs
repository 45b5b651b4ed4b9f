//! Diesel row models for file persistence.

use super::schema::files;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query and insert row for files.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FileRow {
    pub id: uuid::Uuid,
    pub owner_type: String,
    pub owner_id: uuid::Uuid,
    pub name: String,
    pub object_name: String,
    pub size: i64,
    pub img_resized: bool,
    pub img_width: i32,
    pub img_height: i32,
    pub ext: String,
    pub mime_type: String,
    pub bucket_name: String,
    pub endpoint: String,
    pub created_by: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub to_deleted_at: Option<DateTime<Utc>>,
}
