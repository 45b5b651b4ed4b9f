//! Application services for field schema orchestration.

mod schema_service;

pub use schema_service::{
    AddProjectFieldRequest, FieldSchemaService, FieldSchemaServiceError, FieldSchemaServiceResult,
};
