//! `PostgreSQL` adapters for file records.

mod models;
mod repository;
mod schema;

pub use repository::{FilePgPool, PostgresFileRepository};
