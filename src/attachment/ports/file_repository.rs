//! Repository port for file records.

use crate::attachment::domain::{File, FileOwner};
use crate::shared::{Classify, ErrorKind, FileId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for file repository operations.
pub type FileRepositoryResult<T> = Result<T, FileRepositoryError>;

/// File record persistence contract.
///
/// Reads never return records whose removal has completed.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// Returns [`FileRepositoryError::Duplicate`] when the identifier is
    /// taken.
    async fn create(&self, file: &File) -> FileRepositoryResult<()>;

    /// Finds a live record.
    async fn find(&self, id: FileId) -> FileRepositoryResult<Option<File>>;

    /// Lists live records of an owner, oldest first.
    async fn list_for_owner(&self, owner: FileOwner) -> FileRepositoryResult<Vec<File>>;

    /// Stamps the start of removal.
    ///
    /// # Errors
    ///
    /// Returns [`FileRepositoryError::NotFound`] for unknown identifiers.
    async fn mark_for_delete(&self, id: FileId, at: DateTime<Utc>) -> FileRepositoryResult<()>;

    /// Stamps removal completion.
    ///
    /// # Errors
    ///
    /// Returns [`FileRepositoryError::NotFound`] when the record is unknown
    /// or already removed.
    async fn mark_deleted(&self, id: FileId, at: DateTime<Utc>) -> FileRepositoryResult<()>;

    /// Replaces the display name of a live record.
    ///
    /// # Errors
    ///
    /// Returns [`FileRepositoryError::NotFound`] when the record is unknown
    /// or removed.
    async fn rename(&self, id: FileId, name: &str) -> FileRepositoryResult<()>;
}

/// Errors returned by file repository implementations.
#[derive(Debug, Clone, Error)]
pub enum FileRepositoryError {
    /// A record with the same identifier exists.
    #[error("duplicate file identifier: {0}")]
    Duplicate(FileId),

    /// No live record for the identifier.
    #[error("file not found: {0}")]
    NotFound(FileId),

    /// A stored record cannot be decoded.
    #[error("corrupt file record: {0}")]
    Corrupt(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FileRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for FileRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

impl Classify for FileRepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Duplicate(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Corrupt(_) => ErrorKind::Internal,
            Self::Persistence(_) => ErrorKind::Transient,
        }
    }
}
