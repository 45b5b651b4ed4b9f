//! In-memory repository for field schema tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::schema::{
    domain::{
        CompanyField, CompanyFieldEdit, FieldHash, NewCompanyField, ProjectField, ProjectFieldUpsert,
        ProjectFieldView,
    },
    ports::{FieldSchemaRepository, FieldSchemaRepositoryError, FieldSchemaRepositoryResult},
};
use crate::shared::{CompanyFieldId, CompanyId, ProjectId};

/// Thread-safe in-memory field schema repository.
///
/// The write lock plays the role of the company row lock while minting.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFieldSchemaRepository {
    state: Arc<RwLock<InMemorySchemaState>>,
}

#[derive(Debug, Default)]
struct InMemorySchemaState {
    counters: HashMap<CompanyId, u64>,
    fields: HashMap<CompanyFieldId, CompanyField>,
    projections: Vec<ProjectField>,
}

impl InMemoryFieldSchemaRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> FieldSchemaRepositoryResult<RwLockReadGuard<'_, InMemorySchemaState>> {
        self.state.read().map_err(|err| {
            FieldSchemaRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> FieldSchemaRepositoryResult<RwLockWriteGuard<'_, InMemorySchemaState>> {
        self.state.write().map_err(|err| {
            FieldSchemaRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn sorted_by_mint_order(mut fields: Vec<CompanyField>) -> Vec<CompanyField> {
    fields.sort_by(|left, right| left.hash().mint_order().cmp(&right.hash().mint_order()));
    fields
}

#[async_trait]
impl FieldSchemaRepository for InMemoryFieldSchemaRepository {
    async fn register_company(&self, company: CompanyId) -> FieldSchemaRepositoryResult<()> {
        let mut state = self.write()?;
        state.counters.entry(company).or_insert(0);
        Ok(())
    }

    async fn company_field_counter(&self, company: CompanyId) -> FieldSchemaRepositoryResult<u64> {
        let state = self.read()?;
        state
            .counters
            .get(&company)
            .copied()
            .ok_or(FieldSchemaRepositoryError::CompanyNotFound(company))
    }

    async fn create_company_field(
        &self,
        draft: NewCompanyField,
        created_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<CompanyField> {
        let company = draft.company;
        let mut state = self.write()?;
        let counter = *state
            .counters
            .get(&company)
            .ok_or(FieldSchemaRepositoryError::CompanyNotFound(company))?;
        let hash = FieldHash::mint(counter)
            .map_err(|_| FieldSchemaRepositoryError::CounterOverflow(company))?;

        let field = CompanyField::from_draft(draft, hash, created_at);
        state.fields.insert(field.id(), field.clone());
        state.counters.insert(company, counter.saturating_add(1));
        Ok(field)
    }

    async fn update_company_field(&self, field: &CompanyField) -> FieldSchemaRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .fields
            .get_mut(&field.id())
            .filter(|stored| stored.is_live())
            .ok_or(FieldSchemaRepositoryError::FieldNotFound(field.id()))?;
        stored.store_edit(
            CompanyFieldEdit {
                name: field.name().to_owned(),
                description: field.description().to_owned(),
                icon: field.icon().to_owned(),
            },
            field.updated_at(),
        );
        Ok(())
    }

    async fn delete_company_field(
        &self,
        id: CompanyFieldId,
        deleted_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .fields
            .get_mut(&id)
            .filter(|stored| stored.is_live())
            .ok_or(FieldSchemaRepositoryError::FieldNotFound(id))?;
        stored.mark_deleted(deleted_at);
        Ok(())
    }

    async fn find_company_field(
        &self,
        id: CompanyFieldId,
    ) -> FieldSchemaRepositoryResult<Option<CompanyField>> {
        let state = self.read()?;
        Ok(state.fields.get(&id).filter(|field| field.is_live()).cloned())
    }

    async fn list_company_fields(
        &self,
        company: CompanyId,
    ) -> FieldSchemaRepositoryResult<Vec<CompanyField>> {
        let state = self.read()?;
        let fields = state
            .fields
            .values()
            .filter(|field| field.company() == company && field.is_live())
            .cloned()
            .collect();
        Ok(sorted_by_mint_order(fields))
    }

    async fn upsert_project_field(
        &self,
        projection: &ProjectField,
    ) -> FieldSchemaRepositoryResult<ProjectFieldUpsert> {
        let mut state = self.write()?;
        let same_pair = |existing: &ProjectField| {
            existing.project == projection.project
                && existing.company_field == projection.company_field
        };

        if let Some(live) = state
            .projections
            .iter_mut()
            .find(|existing| same_pair(existing) && existing.deleted_at.is_none())
        {
            if live.same_attributes(projection) {
                return Ok(ProjectFieldUpsert::Unchanged);
            }
            live.required_on_statuses = projection.required_on_statuses.clone();
            live.style = projection.style;
            return Ok(ProjectFieldUpsert::Updated);
        }

        if let Some(removed) = state.projections.iter_mut().find(|existing| same_pair(existing)) {
            removed.required_on_statuses = projection.required_on_statuses.clone();
            removed.style = projection.style;
            removed.deleted_at = None;
            return Ok(ProjectFieldUpsert::Updated);
        }

        state.projections.push(projection.clone());
        Ok(ProjectFieldUpsert::Created)
    }

    async fn remove_project_field(
        &self,
        project: ProjectId,
        field: CompanyFieldId,
        deleted_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<()> {
        let mut state = self.write()?;
        let live = state
            .projections
            .iter_mut()
            .find(|existing| {
                existing.project == project
                    && existing.company_field == field
                    && existing.deleted_at.is_none()
            })
            .ok_or(FieldSchemaRepositoryError::ProjectionNotFound { project, field })?;
        live.deleted_at = Some(deleted_at);
        Ok(())
    }

    async fn list_project_fields(
        &self,
        project: ProjectId,
    ) -> FieldSchemaRepositoryResult<Vec<ProjectFieldView>> {
        let state = self.read()?;
        let mut views: Vec<ProjectFieldView> = state
            .projections
            .iter()
            .filter(|projection| projection.project == project && projection.deleted_at.is_none())
            .filter_map(|projection| {
                state
                    .fields
                    .get(&projection.company_field)
                    .filter(|field| field.is_live())
                    .map(|field| ProjectFieldView {
                        field: field.clone(),
                        required_on_statuses: projection.required_on_statuses.clone(),
                        style: projection.style,
                    })
            })
            .collect();
        views.sort_by(|left, right| left.hash().mint_order().cmp(&right.hash().mint_order()));
        Ok(views)
    }

    async fn field_projects(
        &self,
        field: CompanyFieldId,
    ) -> FieldSchemaRepositoryResult<Vec<ProjectId>> {
        let state = self.read()?;
        Ok(state
            .projections
            .iter()
            .filter(|projection| projection.company_field == field && projection.deleted_at.is_none())
            .map(|projection| projection.project)
            .collect())
    }
}
