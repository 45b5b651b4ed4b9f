//! `PostgreSQL` adapters for field schema persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresFieldSchemaRepository, SchemaPgPool};
