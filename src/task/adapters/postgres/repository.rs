//! `PostgreSQL` repository implementation for task lifecycle storage.

use super::{
    models::{NewTaskRow, ProjectRow, TaskChangeset, TaskRow},
    schema::{projects, tasks},
};
use crate::activity::{
    adapters::postgres::{insert_activities, map_insert_error},
    domain::Activity,
};
use crate::schema::{
    domain::{FieldHash, FieldUsageCounts, is_empty_value},
    ports::{FieldSchemaRepositoryError, FieldSchemaRepositoryResult, FieldUsageReader},
};
use crate::shared::{ProjectId, TaskId};
use crate::task::{
    domain::{PersistedTask, Project, Task, TaskColumnWrite},
    ports::{ProjectRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashSet;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task and project repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<i64> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .returning(tasks::number)
                .get_result::<i64>(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })
        })
        .await
    }

    async fn flush(&self, task: &Task, activities: &[Activity]) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task)?;
        let entries = activities.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let updated = diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                    .set(&changeset)
                    .execute(tx)?;
                if updated == 0 {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }
                insert_activities(tx, &entries).map_err(|err| map_insert_error(err, &entries))?;
                Ok(())
            })
        })
        .await
    }

    async fn flush_all(&self, tasks: &[Task], activities: &[Activity]) -> TaskRepositoryResult<()> {
        let changesets = tasks
            .iter()
            .map(|task| Ok((task.id(), to_changeset(task)?)))
            .collect::<TaskRepositoryResult<Vec<_>>>()?;
        let entries = activities.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                for (task_id, changeset) in &changesets {
                    let updated =
                        diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                            .set(changeset)
                            .execute(tx)?;
                    if updated == 0 {
                        return Err(TaskRepositoryError::NotFound(*task_id));
                    }
                }
                insert_activities(tx, &entries).map_err(|err| map_insert_error(err, &entries))?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .filter(tasks::deleted_at.is_null())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_id_with_deleted(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn change_field(
        &self,
        id: TaskId,
        write: TaskColumnWrite,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let mut task = lock_task(tx, id)?;
                task.apply_column(write, now);
                diesel::update(tasks::table.filter(tasks::id.eq(id.into_inner())))
                    .set((
                        tasks::updated_at.eq(task.updated_at()),
                        tasks::activity_at.eq(task.activity_at()),
                        tasks::data.eq(snapshot(&task)?),
                    ))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn children_of(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::path.contains(vec![id.into_inner()]))
                .filter(tasks::id.ne(id.into_inner()))
                .filter(tasks::deleted_at.is_null())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut children = rows
                .into_iter()
                .map(row_to_task)
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            children.sort_by_key(|task| (task.path().len(), task.number()));
            Ok(children)
        })
        .await
    }

    async fn subtree_of(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::path.contains(vec![id.into_inner()]))
                .filter(tasks::id.ne(id.into_inner()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut subtree = rows
                .into_iter()
                .map(row_to_task)
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            subtree.sort_by_key(|task| (task.path().len(), task.number()));
            Ok(subtree)
        })
        .await
    }

    async fn check_path(&self, path: &[TaskId]) -> TaskRepositoryResult<()> {
        let ids: Vec<TaskId> = path.to_vec();
        self.run_blocking(move |connection| {
            let uuids: Vec<uuid::Uuid> = ids.iter().copied().map(TaskId::into_inner).collect();
            let found: HashSet<uuid::Uuid> = tasks::table
                .filter(tasks::id.eq_any(uuids))
                .filter(tasks::deleted_at.is_null())
                .select(tasks::id)
                .load::<uuid::Uuid>(connection)?
                .into_iter()
                .collect();
            ids.iter()
                .find(|id| !found.contains(&id.into_inner()))
                .map_or(Ok(()), |missing| Err(TaskRepositoryError::NotFound(*missing)))
        })
        .await
    }
}

#[async_trait]
impl ProjectRepository for PostgresTaskRepository {
    async fn store_project(&self, project: &Project) -> TaskRepositoryResult<()> {
        let row = ProjectRow {
            id: project.id.into_inner(),
            federation_id: project.federation.into_inner(),
            company_id: project.company.into_inner(),
            snapshot: serde_json::to_value(project)
                .map_err(|err| TaskRepositoryError::Corrupt(err.to_string()))?,
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .on_conflict(projects::id)
                .do_update()
                .set(projects::snapshot.eq(&row.snapshot))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn find_project(&self, id: ProjectId) -> TaskRepositoryResult<Option<Project>> {
        self.run_blocking(move |connection| {
            let row = projects::table
                .filter(projects::id.eq(id.into_inner()))
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()?;
            row.map(|found| {
                serde_json::from_value::<Project>(found.snapshot)
                    .map_err(|err| TaskRepositoryError::Corrupt(err.to_string()))
            })
            .transpose()
        })
        .await
    }
}

#[async_trait]
impl FieldUsageReader for PostgresTaskRepository {
    async fn field_usage(
        &self,
        projects: &[ProjectId],
        hash: &FieldHash,
    ) -> FieldSchemaRepositoryResult<FieldUsageCounts> {
        let scope: Vec<uuid::Uuid> = projects.iter().copied().map(ProjectId::into_inner).collect();
        let key = hash.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::project_id.eq_any(scope))
                .filter(tasks::deleted_at.is_null())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut counts = FieldUsageCounts::default();
            for row in rows {
                let task = row_to_task(row)?;
                counts.tally(
                    !is_empty_value(task.fields().get(key.as_str())),
                    task.is_active(),
                );
            }
            Ok(counts)
        })
        .await
        .map_err(FieldSchemaRepositoryError::persistence)
    }
}

fn lock_task(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<Task> {
    let row = tasks::table
        .filter(tasks::id.eq(id.into_inner()))
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(connection)
        .optional()?
        .ok_or(TaskRepositoryError::NotFound(id))?;
    row_to_task(row)
}

fn snapshot(task: &Task) -> TaskRepositoryResult<serde_json::Value> {
    serde_json::to_value(task.to_persisted())
        .map_err(|err| TaskRepositoryError::Corrupt(err.to_string()))
}

fn path_uuids(task: &Task) -> Vec<uuid::Uuid> {
    task.path().iter().copied().map(TaskId::into_inner).collect()
}

fn to_new_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        federation_id: task.federation().into_inner(),
        company_id: task.company().into_inner(),
        project_id: task.project().into_inner(),
        name: task.name().to_owned(),
        status: task.status(),
        path: path_uuids(task),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        activity_at: task.activity_at(),
        deleted_at: task.deleted_at(),
        data: snapshot(task)?,
    })
}

fn to_changeset(task: &Task) -> TaskRepositoryResult<TaskChangeset> {
    Ok(TaskChangeset {
        project_id: task.project().into_inner(),
        name: task.name().to_owned(),
        status: task.status(),
        path: path_uuids(task),
        updated_at: task.updated_at(),
        activity_at: task.activity_at(),
        deleted_at: task.deleted_at(),
        data: snapshot(task)?,
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let mut data = serde_json::from_value::<PersistedTask>(row.data)
        .map_err(|err| TaskRepositoryError::Corrupt(err.to_string()))?;
    if data.id.into_inner() != row.id {
        return Err(TaskRepositoryError::Corrupt(format!(
            "snapshot of {} stored under {}",
            data.id, row.id
        )));
    }
    // Columns win over the snapshot for sequence and soft-delete state.
    data.number = row.number;
    data.deleted_at = row.deleted_at;
    Ok(Task::from_persisted(data))
}
