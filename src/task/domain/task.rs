//! Task aggregate root.

use super::{
    BuiltinStatus, DirtyKey, DirtySet, MAX_STATUS, Priority, Project, StatusChange,
    StatusTransition, Stop, TaskDomainError, Team, TeamChange, ancestry::{dedup, patch_ancestry},
    team::{dedup_non_empty, participants},
};
use crate::schema::domain::{FilteredFields, ProjectFieldView, find_projected};
use crate::shared::{
    Actor, CompanyId, FederationId, Language, ProjectId, StopId, TaskId, UserId, Validator,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 5000;

/// Attributes of a task about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Owning federation.
    pub federation: FederationId,
    /// Owning company.
    pub company: CompanyId,
    /// Owning project.
    pub project: ProjectId,
    /// Author.
    pub creator: Actor,
    /// Field values as submitted.
    pub raw_fields: BTreeMap<String, Value>,
    /// Tags.
    pub tags: Vec<String>,
    /// Ancestors, root first.
    pub path: Vec<TaskId>,
    /// Roles.
    pub team: Team,
    /// Priority.
    pub priority: Priority,
    /// Due date.
    pub finish_to: Option<DateTime<Utc>>,
    /// Icon name.
    pub icon: String,
    /// Linked catalog entities and the fields they fill.
    pub task_entities: BTreeMap<Uuid, Vec<String>>,
}

impl NewTask {
    /// Creates a draft with no optional attributes.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        federation: FederationId,
        company: CompanyId,
        project: ProjectId,
        creator: Actor,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            federation,
            company,
            project,
            creator,
            raw_fields: BTreeMap::new(),
            tags: Vec::new(),
            path: Vec::new(),
            team: Team::default(),
            priority: Priority::default(),
            finish_to: None,
            icon: String::new(),
            task_entities: BTreeMap::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the submitted field values.
    #[must_use]
    pub fn with_raw_fields(mut self, raw_fields: BTreeMap<String, Value>) -> Self {
        self.raw_fields = raw_fields;
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Places the task under the ancestors in `path`.
    #[must_use]
    pub fn with_path(mut self, path: Vec<TaskId>) -> Self {
        self.path = path;
        self
    }

    /// Sets the roles.
    #[must_use]
    pub fn with_team(mut self, team: Team) -> Self {
        self.team = team;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_finish_to(mut self, finish_to: DateTime<Utc>) -> Self {
        self.finish_to = Some(finish_to);
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

/// Targeted column writes that bypass the dirty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskColumnWrite {
    /// First-open times by user.
    FirstOpen(BTreeMap<UserId, DateTime<Utc>>),
    /// Status history.
    Stops(Vec<Stop>),
    /// Time of the latest activity.
    ActivityAt(DateTime<Utc>),
}

impl TaskColumnWrite {
    /// Returns the storage column name.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::FirstOpen(_) => "first_open",
            Self::Stops(_) => "stops",
            Self::ActivityAt(_) => "activity_at",
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    number: i64,
    name: String,
    description: String,
    federation: FederationId,
    company: CompanyId,
    project: ProjectId,
    creator: Actor,
    team: Team,
    finished_by: String,
    participants: Vec<String>,
    tags: Vec<String>,
    icon: String,
    status: i32,
    priority: Priority,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    activity_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    finish_to: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    fields: BTreeMap<String, Value>,
    raw_fields: BTreeMap<String, Value>,
    path: Vec<TaskId>,
    stops: Vec<Stop>,
    first_open: BTreeMap<UserId, DateTime<Utc>>,
    task_entities: BTreeMap<Uuid, Vec<String>>,
    dirty: DirtySet,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTask {
    /// Task identifier.
    pub id: TaskId,
    /// Scoped integer number.
    pub number: i64,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Owning federation.
    pub federation: FederationId,
    /// Owning company.
    pub company: CompanyId,
    /// Owning project.
    pub project: ProjectId,
    /// Author.
    pub creator: Actor,
    /// Roles.
    pub team: Team,
    /// Who completed the task.
    pub finished_by: String,
    /// Derived participant set.
    pub participants: Vec<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Icon.
    pub icon: String,
    /// Status code.
    pub status: i32,
    /// Priority.
    pub priority: Priority,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
    /// Last activity.
    pub activity_at: DateTime<Utc>,
    /// Completion time.
    pub finished_at: Option<DateTime<Utc>>,
    /// Due date.
    pub finish_to: Option<DateTime<Utc>>,
    /// Soft-delete stamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Typed field values.
    pub fields: BTreeMap<String, Value>,
    /// Field values as submitted.
    pub raw_fields: BTreeMap<String, Value>,
    /// Ancestry, ending with the task itself.
    pub path: Vec<TaskId>,
    /// Status history.
    pub stops: Vec<Stop>,
    /// First-open times.
    pub first_open: BTreeMap<UserId, DateTime<Utc>>,
    /// Linked catalog entities.
    pub task_entities: BTreeMap<Uuid, Vec<String>>,
}

impl Task {
    /// Validates a draft and creates a task in the unknown status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Validation`] listing every invalid
    /// attribute.
    pub fn new(
        draft: NewTask,
        validator: &Validator,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        validator
            .checks()
            .length("name", &draft.name, NAME_MIN, NAME_MAX)
            .max_length("description", &draft.description, DESCRIPTION_MAX)
            .email("created_by", draft.creator.email())
            .finish()?;

        let id = TaskId::new();
        let mut lineage = draft.path;
        lineage.push(id);
        let path = dedup(&lineage);
        let team = draft.team.normalized();
        let participants = participants(draft.creator.email(), &team);
        let now = clock.utc();

        Ok(Self {
            id,
            number: 0,
            name: draft.name,
            description: draft.description,
            federation: draft.federation,
            company: draft.company,
            project: draft.project,
            creator: draft.creator,
            team,
            finished_by: String::new(),
            participants,
            tags: dedup_non_empty(&draft.tags),
            icon: draft.icon,
            status: BuiltinStatus::Unknown.code(),
            priority: draft.priority,
            created_at: now,
            updated_at: now,
            activity_at: now,
            finished_at: None,
            finish_to: draft.finish_to,
            deleted_at: None,
            fields: BTreeMap::new(),
            raw_fields: draft.raw_fields,
            path,
            stops: Vec::new(),
            first_open: BTreeMap::new(),
            task_entities: draft.task_entities,
            dirty: DirtySet::default(),
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTask) -> Self {
        Self {
            id: data.id,
            number: data.number,
            name: data.name,
            description: data.description,
            federation: data.federation,
            company: data.company,
            project: data.project,
            creator: data.creator,
            team: data.team,
            finished_by: data.finished_by,
            participants: data.participants,
            tags: data.tags,
            icon: data.icon,
            status: data.status,
            priority: data.priority,
            created_at: data.created_at,
            updated_at: data.updated_at,
            activity_at: data.activity_at,
            finished_at: data.finished_at,
            finish_to: data.finish_to,
            deleted_at: data.deleted_at,
            fields: data.fields,
            raw_fields: data.raw_fields,
            path: data.path,
            stops: data.stops,
            first_open: data.first_open,
            task_entities: data.task_entities,
            dirty: DirtySet::default(),
        }
    }

    /// Snapshot suitable for storage.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedTask {
        PersistedTask {
            id: self.id,
            number: self.number,
            name: self.name.clone(),
            description: self.description.clone(),
            federation: self.federation,
            company: self.company,
            project: self.project,
            creator: self.creator.clone(),
            team: self.team.clone(),
            finished_by: self.finished_by.clone(),
            participants: self.participants.clone(),
            tags: self.tags.clone(),
            icon: self.icon.clone(),
            status: self.status,
            priority: self.priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
            activity_at: self.activity_at,
            finished_at: self.finished_at,
            finish_to: self.finish_to,
            deleted_at: self.deleted_at,
            fields: self.fields.clone(),
            raw_fields: self.raw_fields.clone(),
            path: self.path.clone(),
            stops: self.stops.clone(),
            first_open: self.first_open.clone(),
            task_entities: self.task_entities.clone(),
        }
    }

    /// Records the number assigned by storage.
    pub const fn assign_number(&mut self, number: i64) {
        self.number = number;
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the scoped integer number.
    #[must_use]
    pub const fn number(&self) -> i64 {
        self.number
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the owning federation.
    #[must_use]
    pub const fn federation(&self) -> FederationId {
        self.federation
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company(&self) -> CompanyId {
        self.company
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project(&self) -> ProjectId {
        self.project
    }

    /// Returns the author.
    #[must_use]
    pub const fn creator(&self) -> &Actor {
        &self.creator
    }

    /// Returns the roles.
    #[must_use]
    pub const fn team(&self) -> &Team {
        &self.team
    }

    /// Returns who completed the task; empty unless done.
    #[must_use]
    pub fn finished_by(&self) -> &str {
        &self.finished_by
    }

    /// Returns the participant set.
    #[must_use]
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the icon.
    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> i32 {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update time.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the last activity time.
    #[must_use]
    pub const fn activity_at(&self) -> DateTime<Utc> {
        self.activity_at
    }

    /// Returns the completion time.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the due date.
    #[must_use]
    pub const fn finish_to(&self) -> Option<DateTime<Utc>> {
        self.finish_to
    }

    /// Returns the soft-delete stamp.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns `true` unless soft-deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Returns `true` unless the task is done or cancelled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status != BuiltinStatus::Done.code() && self.status != BuiltinStatus::Cancel.code()
    }

    /// Returns the typed field values.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Returns the field values as last submitted.
    #[must_use]
    pub const fn raw_fields(&self) -> &BTreeMap<String, Value> {
        &self.raw_fields
    }

    /// Returns the ancestry, ending with this task.
    #[must_use]
    pub fn path(&self) -> &[TaskId] {
        &self.path
    }

    /// Returns the direct parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<TaskId> {
        self.path.iter().rev().nth(1).copied()
    }

    /// Returns the status history.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Returns first-open times by user.
    #[must_use]
    pub const fn first_open(&self) -> &BTreeMap<UserId, DateTime<Utc>> {
        &self.first_open
    }

    /// Returns the linked catalog entities.
    #[must_use]
    pub const fn task_entities(&self) -> &BTreeMap<Uuid, Vec<String>> {
        &self.task_entities
    }

    /// Returns the pending pre-images.
    #[must_use]
    pub const fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    /// Drains the pending pre-images in journal order.
    pub fn take_dirty(&mut self) -> Vec<(DirtyKey, Value)> {
        self.dirty.drain()
    }

    /// Returns the current value tracked under `key`.
    #[must_use]
    pub fn current_value(&self, key: &DirtyKey) -> Value {
        match key {
            DirtyKey::Name => Value::from(self.name.as_str()),
            DirtyKey::Status => Value::from(self.status),
            DirtyKey::Description => Value::from(self.description.as_str()),
            DirtyKey::Priority => Value::from(self.priority.value()),
            DirtyKey::FinishTo => instant(self.finish_to),
            DirtyKey::Icon => Value::from(self.icon.as_str()),
            DirtyKey::Tags => strings(&self.tags),
            DirtyKey::Project => Value::from(self.project.to_string()),
            DirtyKey::Path => ids(&self.path),
            DirtyKey::Field(hash) | DirtyKey::FieldArray(hash) => {
                self.fields.get(hash).cloned().unwrap_or(Value::Null)
            }
            DirtyKey::ResponsibleBy => Value::from(self.team.responsible.as_str()),
            DirtyKey::ImplementBy => Value::from(self.team.implementer.as_str()),
            DirtyKey::ManagedBy => Value::from(self.team.manager.as_str()),
            DirtyKey::CoWorkersBy => strings(&self.team.co_workers),
            DirtyKey::WatchBy => strings(&self.team.watchers),
            DirtyKey::DeletedAt => instant(self.deleted_at),
        }
    }

    /// Renames the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Validation`] unless the name has 3 to 100
    /// characters.
    pub fn patch_name(
        &mut self,
        name: impl Into<String>,
        validator: &Validator,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let next = name.into();
        validator
            .checks()
            .length("name", &next, NAME_MIN, NAME_MAX)
            .finish()?;
        if next == self.name {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.name, next);
        self.dirty.record(DirtyKey::Name, Value::from(previous));
        self.touch(clock);
        Ok(())
    }

    /// Replaces the description.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Validation`] for descriptions over 5000
    /// characters.
    pub fn patch_description(
        &mut self,
        description: impl Into<String>,
        validator: &Validator,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let next = description.into();
        validator
            .checks()
            .max_length("description", &next, DESCRIPTION_MAX)
            .finish()?;
        if next == self.description {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.description, next);
        self.dirty.record(DirtyKey::Description, Value::from(previous));
        self.touch(clock);
        Ok(())
    }

    /// Replaces the icon.
    pub fn patch_icon(&mut self, icon: impl Into<String>, clock: &impl Clock) {
        let next = icon.into();
        if next == self.icon {
            return;
        }
        let previous = std::mem::replace(&mut self.icon, next);
        self.dirty.record(DirtyKey::Icon, Value::from(previous));
        self.touch(clock);
    }

    /// Changes the priority.
    pub fn patch_priority(&mut self, priority: Priority, clock: &impl Clock) {
        if priority == self.priority {
            return;
        }
        self.dirty
            .record(DirtyKey::Priority, Value::from(self.priority.value()));
        self.priority = priority;
        self.touch(clock);
    }

    /// Changes or clears the due date.
    pub fn patch_finish_to(&mut self, finish_to: Option<DateTime<Utc>>, clock: &impl Clock) {
        if finish_to == self.finish_to {
            return;
        }
        self.dirty.record(DirtyKey::FinishTo, instant(self.finish_to));
        self.finish_to = finish_to;
        self.touch(clock);
    }

    /// Replaces the tags; blanks and repeats are dropped.
    pub fn patch_tags(&mut self, tags: &[String], clock: &impl Clock) {
        let cleaned = dedup_non_empty(tags);
        if cleaned == self.tags {
            return;
        }
        self.dirty.record(DirtyKey::Tags, strings(&self.tags));
        self.tags = cleaned;
        self.touch(clock);
    }

    /// Applies a partial team update and recomputes participants.
    pub fn patch_team(&mut self, change: TeamChange, clock: &impl Clock) {
        let mut changed = false;
        if let Some(responsible) = change.responsible {
            changed |= Self::replace_role(
                &mut self.dirty,
                DirtyKey::ResponsibleBy,
                &mut self.team.responsible,
                responsible,
            );
        }
        if let Some(implementer) = change.implementer {
            changed |= Self::replace_role(
                &mut self.dirty,
                DirtyKey::ImplementBy,
                &mut self.team.implementer,
                implementer,
            );
        }
        if let Some(manager) = change.manager {
            changed |= Self::replace_role(
                &mut self.dirty,
                DirtyKey::ManagedBy,
                &mut self.team.manager,
                manager,
            );
        }
        if let Some(co_workers) = change.co_workers {
            changed |= Self::replace_members(
                &mut self.dirty,
                DirtyKey::CoWorkersBy,
                &mut self.team.co_workers,
                &co_workers,
            );
        }
        if let Some(watchers) = change.watchers {
            changed |= Self::replace_members(
                &mut self.dirty,
                DirtyKey::WatchBy,
                &mut self.team.watchers,
                &watchers,
            );
        }
        if changed {
            self.participants = participants(self.creator.email(), &self.team);
            self.touch(clock);
        }
    }

    fn replace_role(dirty: &mut DirtySet, key: DirtyKey, slot: &mut String, next: String) -> bool {
        if *slot == next {
            return false;
        }
        let previous = std::mem::replace(slot, next);
        dirty.record(key, Value::from(previous));
        true
    }

    fn replace_members(
        dirty: &mut DirtySet,
        key: DirtyKey,
        slot: &mut Vec<String>,
        next: &[String],
    ) -> bool {
        let cleaned = dedup_non_empty(next);
        if *slot == cleaned {
            return false;
        }
        let previous = std::mem::replace(slot, cleaned);
        dirty.record(key, strings(&previous));
        true
    }

    /// Moves the task to `change.target` along the project's workflow.
    ///
    /// The checks run in a fixed order: same status, reachability, return to
    /// unknown, mandatory comments, range. Entering done stamps
    /// `finished_at`/`finished_by`; any other status clears them.
    ///
    /// # Errors
    ///
    /// Returns the [`TaskDomainError`] of the first failing check.
    pub fn patch_status(
        &mut self,
        change: StatusChange,
        project: &Project,
        language: Language,
        clock: &impl Clock,
    ) -> Result<StatusTransition, TaskDomainError> {
        let current = self.status;
        let target = change.target;
        if target == current {
            return Err(TaskDomainError::SameStatus(target));
        }

        let reachability = project.workflow().reachable_status(current, target);
        if !reachability.reachable {
            return Err(TaskDomainError::StatusTransitionDenied {
                from: current,
                to: target,
                path: reachability.path,
            });
        }

        if target == BuiltinStatus::Unknown.code() {
            return Err(TaskDomainError::ReturnToUnknown);
        }
        let comment_required =
            project.options.require_cancelation_comment && change.comment.is_empty();
        if target == BuiltinStatus::Cancel.code() && comment_required {
            return Err(TaskDomainError::CancelReasonRequired);
        }
        if target == BuiltinStatus::Done.code() && comment_required {
            return Err(TaskDomainError::DoneReasonRequired);
        }
        if !(0..=MAX_STATUS).contains(&target) {
            return Err(TaskDomainError::StatusOutOfRange(target));
        }

        let now = clock.utc();
        self.dirty.record(DirtyKey::Status, Value::from(current));
        self.status = target;
        let status_name = project.status_view(target, language).name;
        let stop = Stop::new(&change.actor, target, status_name, change.comment, now);
        let stop_id = stop.id;
        self.stops.push(stop);

        if target == BuiltinStatus::Done.code() {
            self.finished_at = Some(now);
            self.finished_by = change.actor.email().to_owned();
        } else {
            self.finished_at = None;
            self.finished_by.clear();
        }
        self.touch(clock);

        Ok(StatusTransition {
            stop: stop_id,
            path: reachability.path,
        })
    }

    /// Sets one dynamic field value.
    ///
    /// Set-valued types are tracked under [`DirtyKey::FieldArray`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::FieldNotProjected`] when `hash` is not
    /// projected onto the task's project.
    pub fn set_field(
        &mut self,
        hash: &str,
        value: Value,
        projection: &[ProjectFieldView],
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let key = Self::field_key(hash, projection)?;
        self.raw_fields.insert(hash.to_owned(), value.clone());
        let previous = self.fields.get(hash).cloned().unwrap_or(Value::Null);
        if previous == value {
            return Ok(());
        }
        self.dirty.record(key, previous);
        self.fields.insert(hash.to_owned(), value);
        self.touch(clock);
        Ok(())
    }

    /// Removes one dynamic field value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::FieldNotProjected`] when `hash` is not
    /// projected onto the task's project.
    pub fn remove_field(
        &mut self,
        hash: &str,
        projection: &[ProjectFieldView],
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let key = Self::field_key(hash, projection)?;
        self.raw_fields.remove(hash);
        let Some(previous) = self.fields.remove(hash) else {
            return Ok(());
        };
        self.dirty.record(key, previous);
        self.touch(clock);
        Ok(())
    }

    /// Applies coerced values and removals.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::FieldNotProjected`] for the first hash not
    /// projected onto the task's project.
    pub fn apply_fields(
        &mut self,
        filtered: FilteredFields,
        projection: &[ProjectFieldView],
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        for (hash, value) in filtered.set {
            self.set_field(&hash, value, projection, clock)?;
        }
        for hash in &filtered.removed {
            self.remove_field(hash, projection, clock)?;
        }
        Ok(())
    }

    fn field_key(hash: &str, projection: &[ProjectFieldView]) -> Result<DirtyKey, TaskDomainError> {
        let view = find_projected(projection, hash)
            .ok_or_else(|| TaskDomainError::FieldNotProjected(hash.to_owned()))?;
        Ok(if view.data_type().is_set_valued() {
            DirtyKey::FieldArray(hash.to_owned())
        } else {
            DirtyKey::Field(hash.to_owned())
        })
    }

    /// Re-parents the task under `parent`, or makes it a root when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfParent`] or
    /// [`TaskDomainError::ParentCycle`] when the move would break the tree.
    pub fn patch_parent(
        &mut self,
        parent: Option<&Self>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let path = match parent {
            None => vec![self.id],
            Some(parent) if parent.id == self.id => {
                return Err(TaskDomainError::SelfParent(self.id));
            }
            Some(parent) if parent.path.contains(&self.id) => {
                return Err(TaskDomainError::ParentCycle {
                    task: self.id,
                    parent: parent.id,
                });
            }
            Some(parent) => {
                let mut lineage = parent.path.clone();
                lineage.push(self.id);
                patch_ancestry(&parent.id, &self.id, &lineage)
            }
        };
        if path == self.path {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.path, path);
        self.dirty.record(DirtyKey::Path, ids(&previous));
        self.touch(clock);
        Ok(())
    }

    /// Re-roots the path after the ancestor `moved` changed parent.
    ///
    /// `moved_path` is the new path of `moved`, ending with it. The part of
    /// this task's path below `moved` is kept. Returns `false` when `moved`
    /// is not an ancestor or the path does not change.
    pub fn rebase_path(
        &mut self,
        moved: TaskId,
        moved_path: &[TaskId],
        clock: &impl Clock,
    ) -> bool {
        let Some(position) = self.path.iter().position(|id| *id == moved) else {
            return false;
        };
        let mut lineage = moved_path.to_vec();
        lineage.extend(self.path.iter().skip(position + 1).copied());
        let path = dedup(&lineage);
        if path == self.path {
            return false;
        }
        let previous = std::mem::replace(&mut self.path, path);
        self.dirty.record(DirtyKey::Path, ids(&previous));
        self.touch(clock);
        true
    }

    /// Drops values whose field is not projected onto `target`.
    ///
    /// Each removal is tracked under the key the field has in `source`.
    /// Returns the dropped hashes.
    pub fn retain_projected(
        &mut self,
        source: &[ProjectFieldView],
        target: &[ProjectFieldView],
        clock: &impl Clock,
    ) -> Vec<String> {
        self.raw_fields
            .retain(|hash, _| find_projected(target, hash).is_some());
        let stale: Vec<String> = self
            .fields
            .keys()
            .filter(|hash| find_projected(target, hash).is_none())
            .cloned()
            .collect();
        for hash in &stale {
            let Some(previous) = self.fields.remove(hash) else {
                continue;
            };
            let key = Self::field_key(hash, source)
                .unwrap_or_else(|_| DirtyKey::Field(hash.clone()));
            self.dirty.record(key, previous);
        }
        if !stale.is_empty() {
            self.touch(clock);
        }
        stale
    }

    /// Moves the task into another project of the same company.
    ///
    /// # Errors
    ///
    /// Returns a precondition [`TaskDomainError`] when the project belongs
    /// elsewhere or already holds the task.
    pub fn move_to_project(
        &mut self,
        project: &Project,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if project.federation != self.federation {
            return Err(TaskDomainError::ForeignFederation);
        }
        if project.company != self.company {
            return Err(TaskDomainError::ForeignCompany);
        }
        if project.id == self.project {
            return Err(TaskDomainError::AlreadyInProject(project.id));
        }
        self.dirty
            .record(DirtyKey::Project, Value::from(self.project.to_string()));
        self.project = project.id;
        self.touch(clock);
        Ok(())
    }

    /// Soft-deletes the task. Deleting twice keeps the first stamp.
    pub fn soft_delete(&mut self, clock: &impl Clock) {
        if self.deleted_at.is_some() {
            return;
        }
        self.dirty.record(DirtyKey::DeletedAt, Value::Null);
        self.deleted_at = Some(clock.utc());
        self.touch(clock);
    }

    /// Clears the soft-delete stamp.
    pub fn restore(&mut self, clock: &impl Clock) {
        if self.deleted_at.is_none() {
            return;
        }
        self.dirty.record(DirtyKey::DeletedAt, instant(self.deleted_at));
        self.deleted_at = None;
        self.touch(clock);
    }

    /// Removes one entry from the status history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StopNotFound`] when no entry matches.
    pub fn delete_stop(&mut self, stop: StopId) -> Result<TaskColumnWrite, TaskDomainError> {
        let before = self.stops.len();
        self.stops.retain(|entry| entry.id != stop);
        if self.stops.len() == before {
            return Err(TaskDomainError::StopNotFound(stop));
        }
        Ok(TaskColumnWrite::Stops(self.stops.clone()))
    }

    /// Records the first time `user` opened the task.
    ///
    /// Returns the column write when this is the user's first open.
    pub fn mark_opened(&mut self, user: UserId, clock: &impl Clock) -> Option<TaskColumnWrite> {
        if self.first_open.contains_key(&user) {
            return None;
        }
        self.first_open.insert(user, clock.utc());
        Some(TaskColumnWrite::FirstOpen(self.first_open.clone()))
    }

    /// Applies a targeted column write and stamps `updated_at`.
    pub fn apply_column(&mut self, write: TaskColumnWrite, now: DateTime<Utc>) {
        match write {
            TaskColumnWrite::FirstOpen(first_open) => self.first_open = first_open,
            TaskColumnWrite::Stops(stops) => self.stops = stops,
            TaskColumnWrite::ActivityAt(at) => self.activity_at = at,
        }
        self.updated_at = now;
    }

    fn touch(&mut self, clock: &impl Clock) {
        let now = clock.utc();
        self.updated_at = now;
        self.activity_at = now;
    }
}

fn instant(value: Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |at| Value::from(at.to_rfc3339()))
}

fn strings(values: &[String]) -> Value {
    Value::from(values.to_vec())
}

fn ids(values: &[TaskId]) -> Value {
    Value::Array(
        values
            .iter()
            .map(|id| Value::from(id.to_string()))
            .collect(),
    )
}
