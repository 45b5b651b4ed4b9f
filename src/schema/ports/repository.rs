//! Repository port for company fields and their project projections.

use crate::schema::domain::{
    CompanyField, FieldHash, FieldUsageCounts, NewCompanyField, ProjectField, ProjectFieldUpsert,
    ProjectFieldView,
};
use crate::shared::{Classify, CompanyFieldId, CompanyId, ErrorKind, ProjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for field schema repository operations.
pub type FieldSchemaRepositoryResult<T> = Result<T, FieldSchemaRepositoryError>;

/// Field schema persistence contract.
#[async_trait]
pub trait FieldSchemaRepository: Send + Sync {
    /// Registers a company with a zero field counter.
    ///
    /// Registering an existing company is a no-op.
    async fn register_company(&self, company: CompanyId) -> FieldSchemaRepositoryResult<()>;

    /// Returns the company's `field_last_name` counter.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaRepositoryError::CompanyNotFound`] for unknown
    /// companies.
    async fn company_field_counter(&self, company: CompanyId) -> FieldSchemaRepositoryResult<u64>;

    /// Creates a company field, minting its hash.
    ///
    /// Locks the company, reads its counter, mints the next hash, inserts the
    /// field and increments the counter in one unit of work, so concurrent
    /// callers on one company serialize.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaRepositoryError::CompanyNotFound`] for unknown
    /// companies.
    async fn create_company_field(
        &self,
        draft: NewCompanyField,
        created_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<CompanyField>;

    /// Persists name, description, and icon of an existing field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaRepositoryError::FieldNotFound`] when the field
    /// is missing or deleted.
    async fn update_company_field(&self, field: &CompanyField) -> FieldSchemaRepositoryResult<()>;

    /// Soft-deletes a company field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaRepositoryError::FieldNotFound`] when the field
    /// is missing or already deleted.
    async fn delete_company_field(
        &self,
        id: CompanyFieldId,
        deleted_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<()>;

    /// Finds a live company field.
    async fn find_company_field(
        &self,
        id: CompanyFieldId,
    ) -> FieldSchemaRepositoryResult<Option<CompanyField>>;

    /// Lists live company fields in mint order.
    async fn list_company_fields(
        &self,
        company: CompanyId,
    ) -> FieldSchemaRepositoryResult<Vec<CompanyField>>;

    /// Inserts or updates the projection of a field onto a project.
    ///
    /// A live projection with identical attributes yields
    /// [`ProjectFieldUpsert::Unchanged`]; a removed one is revived.
    async fn upsert_project_field(
        &self,
        projection: &ProjectField,
    ) -> FieldSchemaRepositoryResult<ProjectFieldUpsert>;

    /// Soft-deletes the live projection of `field` onto `project`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaRepositoryError::ProjectionNotFound`] when no
    /// live projection exists.
    async fn remove_project_field(
        &self,
        project: ProjectId,
        field: CompanyFieldId,
        deleted_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<()>;

    /// Lists live fields projected onto a project, in mint order.
    async fn list_project_fields(
        &self,
        project: ProjectId,
    ) -> FieldSchemaRepositoryResult<Vec<ProjectFieldView>>;

    /// Lists the projects carrying a live projection of `field`.
    async fn field_projects(
        &self,
        field: CompanyFieldId,
    ) -> FieldSchemaRepositoryResult<Vec<ProjectId>>;
}

/// Read side counting how tasks use a field.
///
/// Implemented by task storage; the schema context treats the result as
/// opaque.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldUsageReader: Send + Sync {
    /// Counts live tasks of `projects` and how many carry a value for `hash`.
    async fn field_usage(
        &self,
        projects: &[ProjectId],
        hash: &FieldHash,
    ) -> FieldSchemaRepositoryResult<FieldUsageCounts>;
}

/// Errors returned by field schema repository implementations.
#[derive(Debug, Clone, Error)]
pub enum FieldSchemaRepositoryError {
    /// The company is not registered.
    #[error("company not found: {0}")]
    CompanyNotFound(CompanyId),

    /// The company field is missing or deleted.
    #[error("company field not found: {0}")]
    FieldNotFound(CompanyFieldId),

    /// No live projection of the field onto the project.
    #[error("field {field} is not projected onto project {project}")]
    ProjectionNotFound {
        /// Project.
        project: ProjectId,
        /// Company field.
        field: CompanyFieldId,
    },

    /// The company counter cannot be incremented.
    #[error("field counter overflow for company {0}")]
    CounterOverflow(CompanyId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FieldSchemaRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for FieldSchemaRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

impl Classify for FieldSchemaRepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::CompanyNotFound(_) | Self::FieldNotFound(_) | Self::ProjectionNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::CounterOverflow(_) => ErrorKind::Internal,
            Self::Persistence(_) => ErrorKind::Transient,
        }
    }
}
