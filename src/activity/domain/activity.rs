//! Activity records and their type codes.

use super::ActivityDomainError;
use crate::shared::{Actor, ActivityId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity type tag stored on task activities.
pub const TASK_ENTITY: &str = "task";

/// Kind of change an activity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Scalar attribute or field changed.
    TaskField,
    /// Status changed.
    TaskStatus,
    /// Name changed.
    TaskName,
    /// Parent changed.
    TaskParent,
    /// Set-valued attribute or field changed.
    TaskFieldArray,
    /// Team membership changed.
    TaskTeamArray,
    /// Task soft-deleted.
    TaskWasDeleted,
    /// Attachment removed from the task.
    TaskFileWasDeleted,
}

impl ActivityKind {
    /// Returns the stored integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::TaskField => 1,
            Self::TaskStatus => 2,
            Self::TaskName => 3,
            Self::TaskParent => 4,
            Self::TaskFieldArray => 5,
            Self::TaskTeamArray => 6,
            Self::TaskWasDeleted => 8,
            Self::TaskFileWasDeleted => 9,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskField => "task_field",
            Self::TaskStatus => "task_status",
            Self::TaskName => "task_name",
            Self::TaskParent => "task_parent",
            Self::TaskFieldArray => "task_field_array",
            Self::TaskTeamArray => "task_team_array",
            Self::TaskWasDeleted => "task_was_deleted",
            Self::TaskFileWasDeleted => "task_file_was_deleted",
        }
    }
}

impl TryFrom<i32> for ActivityKind {
    type Error = ActivityDomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::TaskField),
            2 => Ok(Self::TaskStatus),
            3 => Ok(Self::TaskName),
            4 => Ok(Self::TaskParent),
            5 => Ok(Self::TaskFieldArray),
            6 => Ok(Self::TaskTeamArray),
            8 => Ok(Self::TaskWasDeleted),
            9 => Ok(Self::TaskFileWasDeleted),
            other => Err(ActivityDomainError::UnknownKind(other)),
        }
    }
}

/// Append-only journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Entry identifier.
    pub id: ActivityId,
    /// Task the entry belongs to.
    pub entity: TaskId,
    /// Entity type tag, always [`TASK_ENTITY`] for now.
    pub entity_type: String,
    /// Who made the change.
    pub actor: Actor,
    /// When the change was flushed.
    pub created_at: DateTime<Utc>,
    /// Change kind.
    pub kind: ActivityKind,
    /// Kind-specific payload.
    pub meta: Value,
}

impl Activity {
    /// Creates a task activity with a fresh identifier.
    #[must_use]
    pub fn for_task(
        entity: TaskId,
        actor: Actor,
        kind: ActivityKind,
        meta: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            entity,
            entity_type: TASK_ENTITY.to_owned(),
            actor,
            created_at,
            kind,
            meta,
        }
    }
}
