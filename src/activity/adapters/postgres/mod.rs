//! `PostgreSQL` adapters for the activity journal.

mod models;
mod repository;
mod schema;

pub(crate) use repository::{insert_activities, map_insert_error};
pub use repository::{ActivityPgPool, PostgresActivityRepository};
