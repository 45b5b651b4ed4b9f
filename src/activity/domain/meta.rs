//! Payload shapes stored in [`super::Activity::meta`].

use crate::task::domain::ProjectStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar change: `task_field`, `task_name` and `task_parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChangeMeta {
    /// Previous value.
    pub old: Value,
    /// New value.
    pub new: Value,
    /// Attribute name or field hash.
    pub name: String,
}

/// Status change with the catalog entries of both statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeMeta {
    /// Previous status code.
    pub old: i32,
    /// New status code.
    pub new: i32,
    /// Presentation of the previous status.
    pub old_status: ProjectStatus,
    /// Presentation of the new status.
    pub new_status: ProjectStatus,
}

/// Set-valued change with the computed difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldArrayMeta {
    /// Previous elements.
    pub old: Vec<Value>,
    /// New elements.
    pub new: Vec<Value>,
    /// Elements in `new` but not in `old`.
    pub add: Vec<Value>,
    /// Elements in `old` but not in `new`.
    pub remove: Vec<Value>,
    /// Attribute name or field hash.
    pub name: String,
}

/// Team membership change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamChangeMeta {
    /// Members joining.
    pub add: Vec<Value>,
    /// Members leaving.
    pub remove: Vec<Value>,
    /// Role name.
    pub name: String,
}

/// Soft deletion of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDeletedMeta {
    /// Task name at deletion time.
    pub name: String,
}

/// Removal of a task attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDeletedMeta {
    /// Display name of the file.
    pub name: String,
    /// Extension including the dot.
    pub ext: String,
    /// Size in bytes.
    pub size: i64,
}

/// Elements of `right` missing from `left`, in `right` order.
#[must_use]
pub fn difference(right: &[Value], left: &[Value]) -> Vec<Value> {
    right
        .iter()
        .filter(|item| !left.contains(item))
        .cloned()
        .collect()
}
