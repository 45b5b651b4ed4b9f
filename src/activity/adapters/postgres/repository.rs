//! `PostgreSQL` repository implementation for the activity journal.

use super::{
    models::{ActivityRow, NewActivityRow},
    schema::activities,
};
use crate::activity::{
    domain::{Activity, ActivityKind},
    ports::{
        ActivityPage, ActivityRepository, ActivityRepositoryError, ActivityRepositoryResult,
        ActivitySlice,
    },
};
use crate::shared::{Actor, ActivityId, TaskId, UserId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by activity adapters.
pub type ActivityPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed activity journal.
#[derive(Debug, Clone)]
pub struct PostgresActivityRepository {
    pool: ActivityPgPool,
}

impl PostgresActivityRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ActivityPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ActivityRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ActivityRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ActivityRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ActivityRepositoryError::persistence)?
    }
}

/// Inserts activities on an open connection, typically inside the
/// transaction that writes the task.
pub(crate) fn insert_activities(
    connection: &mut PgConnection,
    entries: &[Activity],
) -> QueryResult<usize> {
    if entries.is_empty() {
        return Ok(0);
    }
    let rows: Vec<NewActivityRow> = entries.iter().map(to_new_row).collect();
    diesel::insert_into(activities::table)
        .values(&rows)
        .execute(connection)
}

#[async_trait]
impl ActivityRepository for PostgresActivityRepository {
    async fn append(&self, entries: &[Activity]) -> ActivityRepositoryResult<()> {
        let owned = entries.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, ActivityRepositoryError, _>(|tx| {
                insert_activities(tx, &owned).map_err(|err| map_insert_error(err, &owned))?;
                Ok(())
            })
        })
        .await
    }

    async fn list_for_entity(
        &self,
        entity: TaskId,
        page: ActivityPage,
    ) -> ActivityRepositoryResult<ActivitySlice> {
        self.run_blocking(move |connection| {
            let total = activities::table
                .filter(activities::entity_uuid.eq(entity.into_inner()))
                .count()
                .get_result::<i64>(connection)?;
            let rows = activities::table
                .filter(activities::entity_uuid.eq(entity.into_inner()))
                .order((activities::created_at.asc(), activities::seq.asc()))
                .limit(i64::from(page.limit))
                .offset(i64::from(page.offset))
                .select(ActivityRow::as_select())
                .load::<ActivityRow>(connection)?;
            let entries = rows
                .into_iter()
                .map(row_to_activity)
                .collect::<ActivityRepositoryResult<Vec<_>>>()?;
            Ok(ActivitySlice {
                activities: entries,
                total: u64::try_from(total).map_err(ActivityRepositoryError::persistence)?,
            })
        })
        .await
    }
}

pub(crate) fn map_insert_error(err: DieselError, entries: &[Activity]) -> ActivityRepositoryError {
    match (&err, entries.first()) {
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), Some(first)) => {
            ActivityRepositoryError::Duplicate(first.id)
        }
        _ => ActivityRepositoryError::persistence(err),
    }
}

fn to_new_row(activity: &Activity) -> NewActivityRow {
    NewActivityRow {
        id: activity.id.into_inner(),
        entity_uuid: activity.entity.into_inner(),
        entity_type: activity.entity_type.clone(),
        created_by_uuid: activity.actor.id().into_inner(),
        created_by: activity.actor.email().to_owned(),
        created_at: activity.created_at,
        kind: activity.kind.code(),
        meta: activity.meta.clone(),
    }
}

fn row_to_activity(row: ActivityRow) -> ActivityRepositoryResult<Activity> {
    Ok(Activity {
        id: ActivityId::from_uuid(row.id),
        entity: TaskId::from_uuid(row.entity_uuid),
        entity_type: row.entity_type,
        actor: Actor::new(UserId::from_uuid(row.created_by_uuid), row.created_by),
        created_at: row.created_at,
        kind: ActivityKind::try_from(row.kind)?,
        meta: row.meta,
    })
}
