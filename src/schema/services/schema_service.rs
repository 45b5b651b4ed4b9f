//! Service layer for company fields and their project projections.

use crate::schema::{
    domain::{
        CompanyField, CompanyFieldEdit, CompanyFieldUsage, NewCompanyField, ProjectField,
        ProjectFieldUpsert, ProjectFieldView, SchemaDomainError,
    },
    ports::{FieldSchemaRepository, FieldSchemaRepositoryError, FieldUsageReader},
};
use crate::shared::{
    ChangeEvent, ChangeFeed, ChangedEntity, Classify, CompanyFieldId, CompanyId, ErrorKind,
    ProjectId, Validator,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for projecting a company field onto a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddProjectFieldRequest {
    project: ProjectId,
    company: CompanyId,
    company_field: CompanyFieldId,
    required_on_statuses: Vec<i32>,
    style: String,
}

impl AddProjectFieldRequest {
    /// Creates a request with no required statuses and the default style.
    #[must_use]
    pub const fn new(project: ProjectId, company: CompanyId, company_field: CompanyFieldId) -> Self {
        Self {
            project,
            company,
            company_field,
            required_on_statuses: Vec::new(),
            style: String::new(),
        }
    }

    /// Sets the statuses on which the field must be filled.
    #[must_use]
    pub fn required_on(mut self, statuses: impl IntoIterator<Item = i32>) -> Self {
        self.required_on_statuses = statuses.into_iter().collect();
        self
    }

    /// Sets the display style.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }
}

/// Service-level errors for field schema operations.
#[derive(Debug, Error)]
pub enum FieldSchemaServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] SchemaDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] FieldSchemaRepositoryError),
    /// The field is missing or deleted.
    #[error("company field not found: {0}")]
    FieldNotFound(CompanyFieldId),
    /// The field belongs to another company.
    #[error("company field {field} does not belong to company {company}")]
    ForeignField {
        /// Requested field.
        field: CompanyFieldId,
        /// Company of the request.
        company: CompanyId,
    },
    /// A live projection with identical attributes already exists.
    #[error("field already added")]
    AlreadyAdded,
}

impl Classify for FieldSchemaServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::FieldNotFound(_) => ErrorKind::NotFound,
            Self::ForeignField { .. } => ErrorKind::Precondition,
            Self::AlreadyAdded => ErrorKind::Conflict,
        }
    }
}

/// Result type for field schema service operations.
pub type FieldSchemaServiceResult<T> = Result<T, FieldSchemaServiceError>;

/// Field schema orchestration service.
#[derive(Clone)]
pub struct FieldSchemaService<S, U, F, C>
where
    S: FieldSchemaRepository,
    U: FieldUsageReader,
    F: ChangeFeed,
    C: Clock + Send + Sync,
{
    repository: Arc<S>,
    usage: Arc<U>,
    feed: Arc<F>,
    clock: Arc<C>,
    validator: Validator,
}

impl<S, U, F, C> FieldSchemaService<S, U, F, C>
where
    S: FieldSchemaRepository,
    U: FieldUsageReader,
    F: ChangeFeed,
    C: Clock + Send + Sync,
{
    /// Creates a new field schema service.
    #[must_use]
    pub const fn new(
        repository: Arc<S>,
        usage: Arc<U>,
        feed: Arc<F>,
        clock: Arc<C>,
        validator: Validator,
    ) -> Self {
        Self {
            repository,
            usage,
            feed,
            clock,
            validator,
        }
    }

    /// Validates a draft and creates the field under a freshly minted hash.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when validation fails or the
    /// company is unknown.
    pub async fn create_company_field(
        &self,
        draft: NewCompanyField,
    ) -> FieldSchemaServiceResult<CompanyField> {
        draft.validate(&self.validator)?;
        let field = self
            .repository
            .create_company_field(draft, self.clock.utc())
            .await?;
        tracing::debug!(field = %field.id(), hash = %field.hash(), "company field created");
        self.publish(field.id()).await;
        Ok(field)
    }

    /// Renames or re-describes a field. The hash never changes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when the field is missing or the
    /// edit fails validation.
    pub async fn update_company_field(
        &self,
        id: CompanyFieldId,
        edit: CompanyFieldEdit,
    ) -> FieldSchemaServiceResult<CompanyField> {
        let mut field = self.load_field(id).await?;
        field.apply_edit(edit, &self.validator, self.clock.utc())?;
        self.repository.update_company_field(&field).await?;
        self.publish(id).await;
        Ok(field)
    }

    /// Soft-deletes a field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when the field is missing.
    pub async fn delete_company_field(&self, id: CompanyFieldId) -> FieldSchemaServiceResult<()> {
        self.repository
            .delete_company_field(id, self.clock.utc())
            .await?;
        self.publish(id).await;
        Ok(())
    }

    /// Projects a company field onto a project.
    ///
    /// Re-adding a removed projection revives it; re-adding a live one with
    /// new attributes updates it.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError::AlreadyAdded`] when a live
    /// projection carries identical attributes.
    pub async fn add_project_field(
        &self,
        request: AddProjectFieldRequest,
    ) -> FieldSchemaServiceResult<ProjectFieldUpsert> {
        let field = self.load_field(request.company_field).await?;
        if field.company() != request.company {
            return Err(FieldSchemaServiceError::ForeignField {
                field: request.company_field,
                company: request.company,
            });
        }

        let projection = ProjectField::new(
            request.project,
            request.company,
            request.company_field,
            request.required_on_statuses,
            &request.style,
            self.clock.utc(),
        )?;
        let outcome = self.repository.upsert_project_field(&projection).await?;
        if outcome == ProjectFieldUpsert::Unchanged {
            return Err(FieldSchemaServiceError::AlreadyAdded);
        }
        self.feed
            .publish(ChangeEvent::new(ChangedEntity::ProjectField, projection.project))
            .await;
        Ok(outcome)
    }

    /// Removes a field from a project.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when no live projection exists.
    pub async fn remove_project_field(
        &self,
        project: ProjectId,
        field: CompanyFieldId,
    ) -> FieldSchemaServiceResult<()> {
        self.repository
            .remove_project_field(project, field, self.clock.utc())
            .await?;
        self.feed
            .publish(ChangeEvent::new(ChangedEntity::ProjectField, project))
            .await;
        Ok(())
    }

    /// Lists the fields projected onto a project.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when the repository fails.
    pub async fn project_fields(
        &self,
        project: ProjectId,
    ) -> FieldSchemaServiceResult<Vec<ProjectFieldView>> {
        Ok(self.repository.list_project_fields(project).await?)
    }

    /// Lists the fields of a company in mint order.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when the repository fails.
    pub async fn company_fields(
        &self,
        company: CompanyId,
    ) -> FieldSchemaServiceResult<Vec<CompanyField>> {
        Ok(self.repository.list_company_fields(company).await?)
    }

    /// Lists the fields of a company with their projects and usage counters.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSchemaServiceError`] when either store fails.
    pub async fn company_field_usage(
        &self,
        company: CompanyId,
    ) -> FieldSchemaServiceResult<Vec<CompanyFieldUsage>> {
        let fields = self.repository.list_company_fields(company).await?;
        let mut usage = Vec::with_capacity(fields.len());
        for field in fields {
            let projects = self.repository.field_projects(field.id()).await?;
            let counts = self.usage.field_usage(&projects, field.hash()).await?;
            usage.push(CompanyFieldUsage {
                field,
                projects,
                counts,
            });
        }
        Ok(usage)
    }

    async fn load_field(&self, id: CompanyFieldId) -> FieldSchemaServiceResult<CompanyField> {
        self.repository
            .find_company_field(id)
            .await?
            .ok_or(FieldSchemaServiceError::FieldNotFound(id))
    }

    async fn publish(&self, id: CompanyFieldId) {
        self.feed
            .publish(ChangeEvent::new(ChangedEntity::CompanyField, id))
            .await;
    }
}
