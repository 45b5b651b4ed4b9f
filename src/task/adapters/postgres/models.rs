//! Diesel row models for task persistence.

use super::schema::{projects, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
///
/// The remaining columns mirror the snapshot for filtering and are not
/// read back.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: uuid::Uuid,
    pub number: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub data: Value,
}

/// Insert model for task records; `number` comes from the sequence.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub id: uuid::Uuid,
    pub federation_id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub name: String,
    pub status: i32,
    pub path: Vec<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activity_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub data: Value,
}

/// Changeset written on every flush.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    pub project_id: uuid::Uuid,
    pub name: String,
    pub status: i32,
    pub path: Vec<uuid::Uuid>,
    pub updated_at: DateTime<Utc>,
    pub activity_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub data: Value,
}

/// Project snapshot row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    pub id: uuid::Uuid,
    pub federation_id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub snapshot: Value,
}
