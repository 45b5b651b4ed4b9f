//! `PostgreSQL` repository implementation for field schema storage.

use super::{
    models::{CompanyFieldRow, NewCompanyFieldRow, NewProjectFieldRow, ProjectFieldRow},
    schema::{companies, company_fields, project_fields},
};
use crate::schema::{
    domain::{
        CompanyField, FieldDataType, FieldHash, FieldStyle, NewCompanyField,
        PersistedCompanyField, ProjectField, ProjectFieldUpsert, ProjectFieldView,
    },
    ports::{FieldSchemaRepository, FieldSchemaRepositoryError, FieldSchemaRepositoryResult},
};
use crate::shared::{CatalogId, CompanyFieldId, CompanyId, ProjectFieldId, ProjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by schema adapters.
pub type SchemaPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed field schema repository.
#[derive(Debug, Clone)]
pub struct PostgresFieldSchemaRepository {
    pool: SchemaPgPool,
}

impl PostgresFieldSchemaRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SchemaPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> FieldSchemaRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> FieldSchemaRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(FieldSchemaRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(FieldSchemaRepositoryError::persistence)?
    }
}

#[async_trait]
impl FieldSchemaRepository for PostgresFieldSchemaRepository {
    async fn register_company(&self, company: CompanyId) -> FieldSchemaRepositoryResult<()> {
        self.run_blocking(move |connection| {
            diesel::insert_into(companies::table)
                .values((
                    companies::id.eq(company.into_inner()),
                    companies::field_last_name.eq(0_i64),
                    companies::created_at.eq(Utc::now()),
                ))
                .on_conflict(companies::id)
                .do_nothing()
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn company_field_counter(&self, company: CompanyId) -> FieldSchemaRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let counter = companies::table
                .filter(companies::id.eq(company.into_inner()))
                .select(companies::field_last_name)
                .first::<i64>(connection)
                .optional()?
                .ok_or(FieldSchemaRepositoryError::CompanyNotFound(company))?;
            u64::try_from(counter).map_err(FieldSchemaRepositoryError::persistence)
        })
        .await
    }

    async fn create_company_field(
        &self,
        draft: NewCompanyField,
        created_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<CompanyField> {
        let company = draft.company;
        self.run_blocking(move |connection| {
            connection.transaction::<_, FieldSchemaRepositoryError, _>(|tx| {
                let stored = companies::table
                    .filter(companies::id.eq(company.into_inner()))
                    .select(companies::field_last_name)
                    .for_update()
                    .first::<i64>(tx)
                    .optional()?
                    .ok_or(FieldSchemaRepositoryError::CompanyNotFound(company))?;
                let counter =
                    u64::try_from(stored).map_err(FieldSchemaRepositoryError::persistence)?;
                let hash = FieldHash::mint(counter)
                    .map_err(|_| FieldSchemaRepositoryError::CounterOverflow(company))?;
                let next = counter
                    .checked_add(1)
                    .and_then(|value| i64::try_from(value).ok())
                    .ok_or(FieldSchemaRepositoryError::CounterOverflow(company))?;

                let field = CompanyField::from_draft(draft, hash, created_at);
                diesel::insert_into(company_fields::table)
                    .values(&to_new_field_row(&field))
                    .execute(tx)?;
                diesel::update(companies::table.filter(companies::id.eq(company.into_inner())))
                    .set(companies::field_last_name.eq(next))
                    .execute(tx)?;
                Ok(field)
            })
        })
        .await
    }

    async fn update_company_field(&self, field: &CompanyField) -> FieldSchemaRepositoryResult<()> {
        let id = field.id();
        let name = field.name().to_owned();
        let description = field.description().to_owned();
        let icon = field.icon().to_owned();
        let updated_at = field.updated_at();
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                company_fields::table
                    .filter(company_fields::id.eq(id.into_inner()))
                    .filter(company_fields::deleted_at.is_null()),
            )
            .set((
                company_fields::name.eq(name),
                company_fields::description.eq(description),
                company_fields::icon.eq(icon),
                company_fields::updated_at.eq(updated_at),
            ))
            .execute(connection)?;
            if updated == 0 {
                return Err(FieldSchemaRepositoryError::FieldNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_company_field(
        &self,
        id: CompanyFieldId,
        deleted_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                company_fields::table
                    .filter(company_fields::id.eq(id.into_inner()))
                    .filter(company_fields::deleted_at.is_null()),
            )
            .set(company_fields::deleted_at.eq(Some(deleted_at)))
            .execute(connection)?;
            if updated == 0 {
                return Err(FieldSchemaRepositoryError::FieldNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_company_field(
        &self,
        id: CompanyFieldId,
    ) -> FieldSchemaRepositoryResult<Option<CompanyField>> {
        self.run_blocking(move |connection| {
            let row = company_fields::table
                .filter(company_fields::id.eq(id.into_inner()))
                .filter(company_fields::deleted_at.is_null())
                .select(CompanyFieldRow::as_select())
                .first::<CompanyFieldRow>(connection)
                .optional()?;
            row.map(row_to_field).transpose()
        })
        .await
    }

    async fn list_company_fields(
        &self,
        company: CompanyId,
    ) -> FieldSchemaRepositoryResult<Vec<CompanyField>> {
        self.run_blocking(move |connection| {
            let rows = company_fields::table
                .filter(company_fields::company_id.eq(company.into_inner()))
                .filter(company_fields::deleted_at.is_null())
                .select(CompanyFieldRow::as_select())
                .load::<CompanyFieldRow>(connection)?;
            let mut fields = rows
                .into_iter()
                .map(row_to_field)
                .collect::<FieldSchemaRepositoryResult<Vec<_>>>()?;
            fields.sort_by(|left, right| left.hash().mint_order().cmp(&right.hash().mint_order()));
            Ok(fields)
        })
        .await
    }

    async fn upsert_project_field(
        &self,
        projection: &ProjectField,
    ) -> FieldSchemaRepositoryResult<ProjectFieldUpsert> {
        let projection = projection.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, FieldSchemaRepositoryError, _>(|tx| {
                let existing = project_fields::table
                    .filter(project_fields::project_id.eq(projection.project.into_inner()))
                    .filter(
                        project_fields::company_field_id
                            .eq(projection.company_field.into_inner()),
                    )
                    .order(project_fields::deleted_at.desc().nulls_first())
                    .select(ProjectFieldRow::as_select())
                    .for_update()
                    .first::<ProjectFieldRow>(tx)
                    .optional()?;

                let statuses: Vec<i32> = projection.required_on_statuses.iter().copied().collect();
                let Some(row) = existing else {
                    diesel::insert_into(project_fields::table)
                        .values(&NewProjectFieldRow {
                            id: projection.id.into_inner(),
                            project_id: projection.project.into_inner(),
                            company_id: projection.company.into_inner(),
                            company_field_id: projection.company_field.into_inner(),
                            required_on_statuses: statuses,
                            style: projection.style.as_str().to_owned(),
                            created_at: projection.created_at,
                        })
                        .execute(tx)?;
                    return Ok(ProjectFieldUpsert::Created);
                };

                let stored = row_to_projection(row)?;
                if stored.deleted_at.is_none() && stored.same_attributes(&projection) {
                    return Ok(ProjectFieldUpsert::Unchanged);
                }
                diesel::update(project_fields::table.filter(project_fields::id.eq(stored.id.into_inner())))
                    .set((
                        project_fields::required_on_statuses.eq(statuses),
                        project_fields::style.eq(projection.style.as_str()),
                        project_fields::deleted_at.eq(None::<DateTime<Utc>>),
                    ))
                    .execute(tx)?;
                Ok(ProjectFieldUpsert::Updated)
            })
        })
        .await
    }

    async fn remove_project_field(
        &self,
        project: ProjectId,
        field: CompanyFieldId,
        deleted_at: DateTime<Utc>,
    ) -> FieldSchemaRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                project_fields::table
                    .filter(project_fields::project_id.eq(project.into_inner()))
                    .filter(project_fields::company_field_id.eq(field.into_inner()))
                    .filter(project_fields::deleted_at.is_null()),
            )
            .set(project_fields::deleted_at.eq(Some(deleted_at)))
            .execute(connection)?;
            if updated == 0 {
                return Err(FieldSchemaRepositoryError::ProjectionNotFound { project, field });
            }
            Ok(())
        })
        .await
    }

    async fn list_project_fields(
        &self,
        project: ProjectId,
    ) -> FieldSchemaRepositoryResult<Vec<ProjectFieldView>> {
        self.run_blocking(move |connection| {
            let rows = project_fields::table
                .inner_join(company_fields::table)
                .filter(project_fields::project_id.eq(project.into_inner()))
                .filter(project_fields::deleted_at.is_null())
                .filter(company_fields::deleted_at.is_null())
                .select((ProjectFieldRow::as_select(), CompanyFieldRow::as_select()))
                .load::<(ProjectFieldRow, CompanyFieldRow)>(connection)?;
            let mut views = rows
                .into_iter()
                .map(|(projection_row, field_row)| {
                    let projection = row_to_projection(projection_row)?;
                    Ok(ProjectFieldView {
                        field: row_to_field(field_row)?,
                        required_on_statuses: projection.required_on_statuses,
                        style: projection.style,
                    })
                })
                .collect::<FieldSchemaRepositoryResult<Vec<_>>>()?;
            views.sort_by(|left, right| left.hash().mint_order().cmp(&right.hash().mint_order()));
            Ok(views)
        })
        .await
    }

    async fn field_projects(
        &self,
        field: CompanyFieldId,
    ) -> FieldSchemaRepositoryResult<Vec<ProjectId>> {
        self.run_blocking(move |connection| {
            let projects = project_fields::table
                .filter(project_fields::company_field_id.eq(field.into_inner()))
                .filter(project_fields::deleted_at.is_null())
                .select(project_fields::project_id)
                .load::<uuid::Uuid>(connection)?;
            Ok(projects.into_iter().map(ProjectId::from_uuid).collect())
        })
        .await
    }
}

fn to_new_field_row(field: &CompanyField) -> NewCompanyFieldRow {
    NewCompanyFieldRow {
        id: field.id().into_inner(),
        company_id: field.company().into_inner(),
        hash: field.hash().as_str().to_owned(),
        name: field.name().to_owned(),
        description: field.description().to_owned(),
        icon: field.icon().to_owned(),
        data_type: field.data_type().code(),
        data_catalog: field.data_catalog().map(CatalogId::into_inner),
        created_by: field.created_by().to_owned(),
        created_at: field.created_at(),
        updated_at: field.updated_at(),
    }
}

fn row_to_field(row: CompanyFieldRow) -> FieldSchemaRepositoryResult<CompanyField> {
    let data_type =
        FieldDataType::try_from(row.data_type).map_err(FieldSchemaRepositoryError::persistence)?;
    Ok(CompanyField::from_persisted(PersistedCompanyField {
        id: CompanyFieldId::from_uuid(row.id),
        company: CompanyId::from_uuid(row.company_id),
        hash: FieldHash::from_persisted(row.hash),
        name: row.name,
        description: row.description,
        icon: row.icon,
        data_type,
        data_catalog: row.data_catalog.map(CatalogId::from_uuid),
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
    }))
}

fn row_to_projection(row: ProjectFieldRow) -> FieldSchemaRepositoryResult<ProjectField> {
    let style =
        FieldStyle::try_from(row.style.as_str()).map_err(FieldSchemaRepositoryError::persistence)?;
    Ok(ProjectField {
        id: ProjectFieldId::from_uuid(row.id),
        project: ProjectId::from_uuid(row.project_id),
        company: CompanyId::from_uuid(row.company_id),
        company_field: CompanyFieldId::from_uuid(row.company_field_id),
        required_on_statuses: row.required_on_statuses.into_iter().collect::<BTreeSet<_>>(),
        style,
        created_at: row.created_at,
        deleted_at: row.deleted_at,
    })
}
