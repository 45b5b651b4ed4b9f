//! Repository ports for task and project persistence.

use crate::activity::{domain::Activity, ports::ActivityRepositoryError};
use crate::shared::{Classify, ErrorKind, ProjectId, TaskId};
use crate::task::domain::{Project, Task, TaskColumnWrite};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and returns its assigned number.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<i64>;

    /// Writes a changed task together with its activities in one unit of
    /// work.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist; neither the task nor any activity is written then.
    async fn flush(&self, task: &Task, activities: &[Activity]) -> TaskRepositoryResult<()>;

    /// Writes several changed tasks together with their activities in one
    /// unit of work, e.g. a re-parented task and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] naming the first missing
    /// task; nothing is written then.
    async fn flush_all(&self, tasks: &[Task], activities: &[Activity]) -> TaskRepositoryResult<()>;

    /// Finds a live task.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Finds a task whether or not it is soft-deleted.
    async fn find_by_id_with_deleted(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Writes one column without touching the journal; `updated_at` is
    /// always set to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for unknown tasks.
    async fn change_field(
        &self,
        id: TaskId,
        write: TaskColumnWrite,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<()>;

    /// Lists live descendants of a task, nearest first.
    async fn children_of(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists every descendant of a task, soft-deleted ones included,
    /// nearest first.
    async fn subtree_of(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Checks that every task in `path` exists and is live.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] naming the first missing
    /// task.
    async fn check_path(&self, path: &[TaskId]) -> TaskRepositoryResult<()>;
}

/// Read access to project snapshots.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores or replaces a project snapshot.
    async fn store_project(&self, project: &Project) -> TaskRepositoryResult<()>;

    /// Finds a project snapshot.
    async fn find_project(&self, id: ProjectId) -> TaskRepositoryResult<Option<Project>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The project was not found.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Activities could not be appended.
    #[error(transparent)]
    Journal(#[from] ActivityRepositoryError),

    /// Stored data cannot be decoded.
    #[error("corrupt task row: {0}")]
    Corrupt(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for TaskRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

impl Classify for TaskRepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTask(_) => ErrorKind::Conflict,
            Self::NotFound(_) | Self::ProjectNotFound(_) => ErrorKind::NotFound,
            Self::Journal(err) => err.kind(),
            Self::Corrupt(_) => ErrorKind::Internal,
            Self::Persistence(_) => ErrorKind::Transient,
        }
    }
}
