//! Domain model for dynamic field schemas.
//!
//! Companies define fields once; projects project a subset of them with
//! per-status requirements. Tasks store values keyed by the field hash, so
//! renaming a field never touches task data.

mod company_field;
mod data_type;
mod error;
mod hash;
mod project_field;
mod required;
mod value_filter;

pub use company_field::{CompanyField, CompanyFieldEdit, NewCompanyField, PersistedCompanyField};
pub use data_type::FieldDataType;
pub use error::{FieldValueError, MissingField, MissingRequiredFields, SchemaDomainError};
pub use hash::{FieldHash, int_to_letters};
pub use project_field::{
    CompanyFieldUsage, FieldStyle, FieldUsageCounts, MAX_REQUIRED_STATUS, ProjectField,
    ProjectFieldUpsert, ProjectFieldView, find_projected, required_statuses,
};
pub use required::{RequiredFieldsCheck, is_empty_value};
pub use value_filter::{FieldValueFilter, FilteredFields};
