//! Error types for task aggregate validation and transitions.

use crate::shared::{Classify, ErrorKind, ProjectId, StopId, TaskId, ValidationErrors};
use crate::workflow::domain::StatusGraphError;
use thiserror::Error;

/// Errors returned while constructing or patching a task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// One or more attributes failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The target status equals the current one.
    #[error("status is already {0}")]
    SameStatus(i32),

    /// The status graph has no route between the two statuses.
    #[error("status {from} cannot be changed to {to}")]
    StatusTransitionDenied {
        /// Current status.
        from: i32,
        /// Requested status.
        to: i32,
        /// Labels visited while searching, for diagnostics.
        path: Vec<String>,
    },

    /// Tasks never return to the unknown status.
    #[error("status cannot be changed back to unknown")]
    ReturnToUnknown,

    /// Cancelling requires a comment in this project.
    #[error("a reason is required to cancel")]
    CancelReasonRequired,

    /// Completing requires a comment in this project.
    #[error("a reason is required to complete")]
    DoneReasonRequired,

    /// Status outside `0..=10`.
    #[error("status must be between 0 and 10, got {0}")]
    StatusOutOfRange(i32),

    /// The field hash is not projected onto the task's project.
    #[error("field '{0}' is not projected onto the project")]
    FieldNotProjected(String),

    /// A task cannot be its own parent.
    #[error("task {0} cannot be its own parent")]
    SelfParent(TaskId),

    /// The parent already descends from the task.
    #[error("task {task} is an ancestor of {parent}")]
    ParentCycle {
        /// Task being re-parented.
        task: TaskId,
        /// Requested parent.
        parent: TaskId,
    },

    /// Moving across federations is not allowed.
    #[error("task cannot move to another federation")]
    ForeignFederation,

    /// Moving across companies is not allowed.
    #[error("task cannot move to another company")]
    ForeignCompany,

    /// The task already lives in the target project.
    #[error("task is already in project {0}")]
    AlreadyInProject(ProjectId),

    /// No stop with this identifier.
    #[error("stop not found: {0}")]
    StopNotFound(StopId),

    /// The project's status graph is unusable.
    #[error(transparent)]
    Graph(#[from] StatusGraphError),
}

impl Classify for TaskDomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::SameStatus(_)
            | Self::ReturnToUnknown
            | Self::StatusOutOfRange(_)
            | Self::FieldNotProjected(_)
            | Self::SelfParent(_) => ErrorKind::Validation,
            Self::StatusTransitionDenied { .. } | Self::ParentCycle { .. } => ErrorKind::Conflict,
            Self::CancelReasonRequired
            | Self::DoneReasonRequired
            | Self::ForeignFederation
            | Self::ForeignCompany
            | Self::AlreadyInProject(_) => ErrorKind::Precondition,
            Self::StopNotFound(_) => ErrorKind::NotFound,
            Self::Graph(err) => err.kind(),
        }
    }
}
