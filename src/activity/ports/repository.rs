//! Repository port for the append-only activity journal.

use crate::activity::domain::{Activity, ActivityDomainError};
use crate::shared::{ActivityId, Classify, ErrorKind, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for activity repository operations.
pub type ActivityRepositoryResult<T> = Result<T, ActivityRepositoryError>;

/// Window over a task's journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPage {
    /// Maximum number of entries.
    pub limit: u32,
    /// Entries skipped from the start.
    pub offset: u32,
}

impl ActivityPage {
    /// Creates a page.
    #[must_use]
    pub const fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for ActivityPage {
    fn default() -> Self {
        Self::new(50, 0)
    }
}

/// Entries of one page plus the size of the whole journal.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySlice {
    /// Entries, oldest first.
    pub activities: Vec<Activity>,
    /// Number of entries for the task.
    pub total: u64,
}

/// Activity persistence contract.
///
/// Entries are never updated or removed.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Appends entries in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityRepositoryError::Duplicate`] when an identifier is
    /// already stored; nothing is appended in that case.
    async fn append(&self, activities: &[Activity]) -> ActivityRepositoryResult<()>;

    /// Lists a task's entries oldest first, ties broken by append order.
    async fn list_for_entity(
        &self,
        entity: TaskId,
        page: ActivityPage,
    ) -> ActivityRepositoryResult<ActivitySlice>;
}

/// Errors returned by activity repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ActivityRepositoryError {
    /// An entry with the same identifier exists.
    #[error("duplicate activity identifier: {0}")]
    Duplicate(ActivityId),

    /// A stored entry cannot be decoded.
    #[error(transparent)]
    Domain(#[from] ActivityDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ActivityRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for ActivityRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

impl Classify for ActivityRepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Duplicate(_) => ErrorKind::Conflict,
            Self::Domain(err) => err.kind(),
            Self::Persistence(_) => ErrorKind::Transient,
        }
    }
}
