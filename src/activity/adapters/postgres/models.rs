//! Diesel row models for activity persistence.

use super::schema::activities;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for activities; `seq` only orders the query.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActivityRow {
    pub id: uuid::Uuid,
    pub entity_uuid: uuid::Uuid,
    pub entity_type: String,
    pub created_by_uuid: uuid::Uuid,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub kind: i32,
    pub meta: serde_json::Value,
}

/// Insert model for activities; `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activities)]
pub struct NewActivityRow {
    pub id: uuid::Uuid,
    pub entity_uuid: uuid::Uuid,
    pub entity_type: String,
    pub created_by_uuid: uuid::Uuid,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub kind: i32,
    pub meta: serde_json::Value,
}
