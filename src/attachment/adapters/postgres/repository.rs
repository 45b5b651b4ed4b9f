//! `PostgreSQL` repository implementation for file records.

use super::{models::FileRow, schema::files};
use crate::attachment::{
    domain::{Dimensions, File, FileOwner, ObjectKey, PersistedFile, StorageLocation},
    ports::{FileRepository, FileRepositoryError, FileRepositoryResult},
};
use crate::shared::{FileId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by file adapters.
pub type FilePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed file repository.
#[derive(Debug, Clone)]
pub struct PostgresFileRepository {
    pool: FilePgPool,
}

impl PostgresFileRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: FilePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> FileRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> FileRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(FileRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(FileRepositoryError::persistence)?
    }
}

#[async_trait]
impl FileRepository for PostgresFileRepository {
    async fn create(&self, file: &File) -> FileRepositoryResult<()> {
        let file_id = file.id();
        let row = to_row(file)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(files::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        FileRepositoryError::Duplicate(file_id)
                    }
                    _ => FileRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find(&self, id: FileId) -> FileRepositoryResult<Option<File>> {
        self.run_blocking(move |connection| {
            let row = files::table
                .filter(files::id.eq(id.into_inner()))
                .filter(files::deleted_at.is_null())
                .select(FileRow::as_select())
                .first::<FileRow>(connection)
                .optional()?;
            row.map(row_to_file).transpose()
        })
        .await
    }

    async fn list_for_owner(&self, owner: FileOwner) -> FileRepositoryResult<Vec<File>> {
        self.run_blocking(move |connection| {
            files::table
                .filter(files::owner_type.eq(owner.kind()))
                .filter(files::owner_id.eq(owner.id()))
                .filter(files::deleted_at.is_null())
                .order(files::created_at.asc())
                .select(FileRow::as_select())
                .load::<FileRow>(connection)?
                .into_iter()
                .map(row_to_file)
                .collect()
        })
        .await
    }

    async fn mark_for_delete(&self, id: FileId, at: DateTime<Utc>) -> FileRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(files::table.filter(files::id.eq(id.into_inner())))
                .set(files::to_deleted_at.eq(Some(at)))
                .execute(connection)?;
            if updated == 0 {
                return Err(FileRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn mark_deleted(&self, id: FileId, at: DateTime<Utc>) -> FileRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                files::table
                    .filter(files::id.eq(id.into_inner()))
                    .filter(files::deleted_at.is_null()),
            )
            .set(files::deleted_at.eq(Some(at)))
            .execute(connection)?;
            if updated == 0 {
                return Err(FileRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn rename(&self, id: FileId, name: &str) -> FileRepositoryResult<()> {
        let new_name = name.to_owned();
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                files::table
                    .filter(files::id.eq(id.into_inner()))
                    .filter(files::deleted_at.is_null()),
            )
            .set(files::name.eq(new_name))
            .execute(connection)?;
            if updated == 0 {
                return Err(FileRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn convert<T, U>(value: T) -> FileRepositoryResult<U>
where
    U: TryFrom<T>,
    U::Error: std::fmt::Display,
{
    U::try_from(value).map_err(|err| FileRepositoryError::Corrupt(err.to_string()))
}

fn to_row(file: &File) -> FileRepositoryResult<FileRow> {
    let (width, height) = file
        .dimensions()
        .map_or((0, 0), |dimensions| (dimensions.width, dimensions.height));
    Ok(FileRow {
        id: file.id().into_inner(),
        owner_type: file.owner().kind().to_owned(),
        owner_id: file.owner().id(),
        name: file.name().to_owned(),
        object_name: file.object_key().as_str().to_owned(),
        size: convert(file.size())?,
        img_resized: file.is_resized(),
        img_width: convert(width)?,
        img_height: convert(height)?,
        ext: file.ext().to_owned(),
        mime_type: file.mime().to_owned(),
        bucket_name: file.location().bucket.clone(),
        endpoint: file.location().endpoint.clone(),
        created_by: file.created_by().into_inner(),
        created_at: file.created_at(),
        deleted_at: file.deleted_at(),
        to_deleted_at: file.to_deleted_at(),
    })
}

fn row_to_file(row: FileRow) -> FileRepositoryResult<File> {
    let owner = FileOwner::from_parts(&row.owner_type, row.owner_id)
        .ok_or_else(|| {
            FileRepositoryError::Corrupt(format!("unknown owner type '{}'", row.owner_type))
        })?;
    let dimensions = if row.img_width == 0 && row.img_height == 0 {
        None
    } else {
        Some(Dimensions {
            width: convert(row.img_width)?,
            height: convert(row.img_height)?,
        })
    };
    Ok(File::from_persisted(PersistedFile {
        id: FileId::from_uuid(row.id),
        owner,
        name: row.name,
        object_key: ObjectKey::from_stored(row.object_name),
        size: convert(row.size)?,
        ext: row.ext,
        mime: row.mime_type,
        dimensions,
        resized: row.img_resized,
        location: StorageLocation {
            bucket: row.bucket_name,
            endpoint: row.endpoint,
        },
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        deleted_at: row.deleted_at,
        to_deleted_at: row.to_deleted_at,
    }))
}
