//! Conversion of a task's dirty set into activity records.

use super::{
    Activity, ActivityDomainError, ActivityKind, FieldArrayMeta, FieldChangeMeta,
    FileDeletedMeta, StatusChangeMeta, TaskDeletedMeta, TeamChangeMeta, meta::difference,
};
use crate::shared::{Actor, Language};
use crate::task::domain::{DirtyKey, Project, Task};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Builds the records of one flush.
///
/// Entries arrive in [`DirtyKey`] order and keep it. Every record shares the
/// task's `updated_at`. Entries whose value did not change produce nothing,
/// except deletion.
#[derive(Debug, Clone, Copy)]
pub struct TaskJournal<'a> {
    task: &'a Task,
    project: &'a Project,
    actor: &'a Actor,
    language: Language,
}

impl<'a> TaskJournal<'a> {
    /// Creates a journal for `task` as changed by `actor`.
    #[must_use]
    pub const fn new(
        task: &'a Task,
        project: &'a Project,
        actor: &'a Actor,
        language: Language,
    ) -> Self {
        Self {
            task,
            project,
            actor,
            language,
        }
    }

    /// Converts drained dirty entries into activities.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityDomainError::Meta`] when a payload cannot be encoded.
    pub fn record(
        &self,
        entries: Vec<(DirtyKey, Value)>,
    ) -> Result<Vec<Activity>, ActivityDomainError> {
        let mut activities = Vec::with_capacity(entries.len());
        for (key, old) in entries {
            let new = self.task.current_value(&key);
            if let Some(activity) = self.entry(&key, old, new)? {
                activities.push(activity);
            }
        }
        Ok(activities)
    }

    fn entry(
        &self,
        key: &DirtyKey,
        old: Value,
        new: Value,
    ) -> Result<Option<Activity>, ActivityDomainError> {
        if matches!(key, DirtyKey::DeletedAt) && !new.is_null() {
            let meta = TaskDeletedMeta {
                name: self.task.name().to_owned(),
            };
            return self.build(ActivityKind::TaskWasDeleted, &meta).map(Some);
        }
        if old == new {
            return Ok(None);
        }

        let activity = match key {
            DirtyKey::Name => self.build(ActivityKind::TaskName, &scalar(key, old, new))?,
            DirtyKey::Status => self.build(ActivityKind::TaskStatus, &self.status(&old, &new))?,
            DirtyKey::Path => self.build(ActivityKind::TaskParent, &scalar(key, old, new))?,
            DirtyKey::Tags => {
                self.build(ActivityKind::TaskFieldArray, &array(key.as_key(), &old, &new))?
            }
            DirtyKey::FieldArray(hash) => {
                self.build(ActivityKind::TaskFieldArray, &array(hash.clone(), &old, &new))?
            }
            DirtyKey::Field(hash) => self.build(
                ActivityKind::TaskField,
                &FieldChangeMeta {
                    old,
                    new,
                    name: hash.clone(),
                },
            )?,
            team if team.is_team() => {
                let before = members(&old);
                let after = members(&new);
                let meta = TeamChangeMeta {
                    add: difference(&after, &before),
                    remove: difference(&before, &after),
                    name: key.as_key(),
                };
                self.build(ActivityKind::TaskTeamArray, &meta)?
            }
            _ => self.build(ActivityKind::TaskField, &scalar(key, old, new))?,
        };
        Ok(Some(activity))
    }

    fn status(&self, old: &Value, new: &Value) -> StatusChangeMeta {
        let before = status_code(old);
        let after = status_code(new);
        StatusChangeMeta {
            old: before,
            new: after,
            old_status: self.project.status_view(before, self.language),
            new_status: self.project.status_view(after, self.language),
        }
    }

    fn build(
        &self,
        kind: ActivityKind,
        meta: &impl Serialize,
    ) -> Result<Activity, ActivityDomainError> {
        Ok(Activity::for_task(
            self.task.id(),
            self.actor.clone(),
            kind,
            serde_json::to_value(meta)?,
            self.task.updated_at(),
        ))
    }
}

/// Builds the record of an attachment removed from `task`.
///
/// # Errors
///
/// Returns [`ActivityDomainError::Meta`] when the payload cannot be encoded.
pub fn file_deleted(
    task: &Task,
    actor: &Actor,
    meta: &FileDeletedMeta,
    created_at: DateTime<Utc>,
) -> Result<Activity, ActivityDomainError> {
    Ok(Activity::for_task(
        task.id(),
        actor.clone(),
        ActivityKind::TaskFileWasDeleted,
        serde_json::to_value(meta)?,
        created_at,
    ))
}

fn scalar(key: &DirtyKey, old: Value, new: Value) -> FieldChangeMeta {
    FieldChangeMeta {
        old,
        new,
        name: key.as_key(),
    }
}

fn array(name: String, old: &Value, new: &Value) -> FieldArrayMeta {
    let before = members(old);
    let after = members(new);
    FieldArrayMeta {
        add: difference(&after, &before),
        remove: difference(&before, &after),
        old: before,
        new: after,
        name,
    }
}

fn members(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::String(text) if text.is_empty() => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn status_code(value: &Value) -> i32 {
    value
        .as_i64()
        .and_then(|code| i32::try_from(code).ok())
        .unwrap_or_default()
}
