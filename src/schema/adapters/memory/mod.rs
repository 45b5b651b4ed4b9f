//! In-memory adapters for field schema storage.

mod field_schema;

pub use field_schema::InMemoryFieldSchemaRepository;
