//! Port contracts for the field schema context.

mod repository;

pub use repository::{
    FieldSchemaRepository, FieldSchemaRepositoryError, FieldSchemaRepositoryResult,
    FieldUsageReader,
};

#[cfg(test)]
pub use repository::MockFieldUsageReader;
