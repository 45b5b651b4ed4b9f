//! Diesel row models for field schema persistence.

use super::schema::{company_fields, project_fields};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for company fields.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = company_fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CompanyFieldRow {
    pub id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub hash: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub data_type: i32,
    pub data_catalog: Option<uuid::Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert model for company fields.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = company_fields)]
pub struct NewCompanyFieldRow {
    pub id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub hash: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub data_type: i32,
    pub data_catalog: Option<uuid::Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for project projections.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = project_fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectFieldRow {
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub company_field_id: uuid::Uuid,
    pub required_on_statuses: Vec<i32>,
    pub style: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert model for project projections.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_fields)]
pub struct NewProjectFieldRow {
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub company_field_id: uuid::Uuid,
    pub required_on_statuses: Vec<i32>,
    pub style: String,
    pub created_at: DateTime<Utc>,
}
