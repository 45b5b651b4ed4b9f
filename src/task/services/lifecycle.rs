//! Service layer for task lifecycle orchestration.

use crate::activity::{
    domain::{Activity, ActivityDomainError, FileDeletedMeta, TaskJournal, file_deleted},
    ports::{ActivityPage, ActivityRepository, ActivityRepositoryError, ActivitySlice},
};
use crate::schema::{
    domain::{
        FieldValueError, FieldValueFilter, MissingRequiredFields, ProjectFieldView,
        RequiredFieldsCheck,
    },
    ports::{FieldSchemaRepository, FieldSchemaRepositoryError},
};
use crate::shared::{
    Actor, ChangeEvent, ChangeFeed, ChangedEntity, Classify, ErrorKind, ProjectId, StopId, TaskId,
    UserId, Validator,
};
use crate::task::{
    domain::{
        NewTask, Priority, PriorityView, Project, StatusChange, Task, TaskColumnWrite,
        TaskDomainError, TeamChange,
    },
    ports::{ProjectRepository, TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Partial update of a task's descriptive attributes.
///
/// `None` leaves an attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetails {
    description: Option<String>,
    priority: Option<Priority>,
    finish_to: Option<Option<DateTime<Utc>>>,
    icon: Option<String>,
    tags: Option<Vec<String>>,
}

impl TaskDetails {
    /// Replaces the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets or clears the due date.
    #[must_use]
    pub const fn finish_to(mut self, finish_to: Option<DateTime<Utc>>) -> Self {
        self.finish_to = Some(finish_to);
        self
    }

    /// Replaces the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Replaces the tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Request to move a task into another project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTaskRequest {
    project: ProjectId,
    status: Option<i32>,
    comment: String,
}

impl MoveTaskRequest {
    /// Moves the task keeping its status.
    #[must_use]
    pub const fn new(project: ProjectId) -> Self {
        Self {
            project,
            status: None,
            comment: String::new(),
        }
    }

    /// Changes the status in the target project as part of the move.
    #[must_use]
    pub fn with_status(mut self, status: i32, comment: impl Into<String>) -> Self {
        self.status = Some(status);
        self.comment = comment.into();
        self
    }
}

/// Result of a successful status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeOutcome {
    /// History entry appended by the change.
    pub stop_id: StopId,
    /// Labels visited while proving reachability.
    pub path: Vec<String>,
    /// Status after the change.
    pub status: i32,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation or transition rule failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Activity repository operation failed.
    #[error(transparent)]
    Journal(#[from] ActivityRepositoryError),
    /// Activity payload could not be built.
    #[error(transparent)]
    Activity(#[from] ActivityDomainError),
    /// Field schema lookup failed.
    #[error(transparent)]
    Schema(#[from] FieldSchemaRepositoryError),
    /// Field values failed coercion.
    #[error(transparent)]
    FieldValues(#[from] FieldValueError),
    /// Fields required on the target status are empty.
    #[error(transparent)]
    MissingRequired(#[from] MissingRequiredFields),
    /// The task does not exist or is deleted.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The parent task does not exist or is deleted.
    #[error("parent task not found: {0}")]
    ParentNotFound(TaskId),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
}

impl Classify for TaskServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::Journal(err) => err.kind(),
            Self::Activity(err) => err.kind(),
            Self::Schema(err) => err.kind(),
            Self::FieldValues(err) => err.kind(),
            Self::MissingRequired(_) => ErrorKind::Precondition,
            Self::TaskNotFound(_) | Self::ParentNotFound(_) | Self::ProjectNotFound(_) => {
                ErrorKind::NotFound
            }
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task lifecycle orchestration service.
///
/// Every mutation loads the task, patches it, turns the dirty set into
/// activities, flushes both in one unit of work and finally publishes a
/// change event.
#[derive(Clone)]
pub struct TaskLifecycleService<R, A, S, F, C>
where
    R: TaskRepository + ProjectRepository,
    A: ActivityRepository,
    S: FieldSchemaRepository,
    F: ChangeFeed,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    activities: Arc<A>,
    schema: Arc<S>,
    feed: Arc<F>,
    clock: Arc<C>,
    validator: Validator,
}

impl<R, A, S, F, C> TaskLifecycleService<R, A, S, F, C>
where
    R: TaskRepository + ProjectRepository,
    A: ActivityRepository,
    S: FieldSchemaRepository,
    F: ChangeFeed,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        activities: Arc<A>,
        schema: Arc<S>,
        feed: Arc<F>,
        clock: Arc<C>,
        validator: Validator,
    ) -> Self {
        Self {
            repository,
            activities,
            schema,
            feed,
            clock,
            validator,
        }
    }

    /// Validates a draft and stores a new task in the unknown status.
    ///
    /// Raw field values are coerced against the project's projection. No
    /// activities are recorded for creation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the project is unknown or foreign,
    /// an ancestor is missing, or validation fails.
    pub async fn create_task(&self, draft: NewTask) -> TaskServiceResult<Task> {
        let project = self.load_project(draft.project).await?;
        if project.federation != draft.federation {
            return Err(TaskDomainError::ForeignFederation.into());
        }
        if project.company != draft.company {
            return Err(TaskDomainError::ForeignCompany.into());
        }
        if !draft.path.is_empty() {
            self.repository.check_path(&draft.path).await?;
        }

        let projection = self.projection(project.id).await?;
        let filtered = FieldValueFilter::filter(&projection, &draft.raw_fields)?;
        let mut task = Task::new(draft, &self.validator, &*self.clock)?;
        task.apply_fields(filtered, &projection, &*self.clock)?;
        task.take_dirty();

        let number = self.repository.store(&task).await?;
        task.assign_number(number);
        tracing::debug!(task = %task.id(), number, project = %project.id, "task created");
        self.publish(task.id()).await;
        Ok(task)
    }

    /// Loads a live task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] for unknown or deleted tasks.
    pub async fn get_task(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.load_task(id).await
    }

    /// Renames a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is missing or the name is
    /// invalid.
    pub async fn rename_task(
        &self,
        id: TaskId,
        name: impl Into<String> + Send,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let (mut task, project) = self.load_with_project(id).await?;
        task.patch_name(name, &self.validator, &*self.clock)?;
        self.commit(&mut task, &project, actor).await
    }

    /// Applies a partial update of descriptive attributes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is missing or an attribute
    /// is invalid; nothing is written then.
    pub async fn update_details(
        &self,
        id: TaskId,
        details: TaskDetails,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let (mut task, project) = self.load_with_project(id).await?;
        let clock = &*self.clock;
        if let Some(description) = details.description {
            task.patch_description(description, &self.validator, clock)?;
        }
        if let Some(icon) = details.icon {
            task.patch_icon(icon, clock);
        }
        if let Some(priority) = details.priority {
            task.patch_priority(priority, clock);
        }
        if let Some(finish_to) = details.finish_to {
            task.patch_finish_to(finish_to, clock);
        }
        if let Some(tags) = details.tags {
            task.patch_tags(&tags, clock);
        }
        self.commit(&mut task, &project, actor).await
    }

    /// Moves a task to another status.
    ///
    /// Fields required on the target status are checked before the workflow
    /// rules.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::MissingRequired`] listing empty required
    /// fields, or the domain error of the first failing transition rule.
    pub async fn change_status(
        &self,
        id: TaskId,
        change: StatusChange,
    ) -> TaskServiceResult<StatusChangeOutcome> {
        let (mut task, project) = self.load_with_project(id).await?;
        let projection = self.projection(project.id).await?;
        let actor = change.actor.clone();
        let outcome = self.apply_status(&mut task, &project, &projection, change)?;
        self.commit(&mut task, &project, &actor).await?;
        Ok(outcome)
    }

    /// Coerces and applies dynamic field values; `null` removes a value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::FieldValues`] when a value has the wrong
    /// shape or a key is not projected onto the task's project.
    pub async fn set_fields(
        &self,
        id: TaskId,
        raw: &BTreeMap<String, Value>,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let (mut task, project) = self.load_with_project(id).await?;
        let projection = self.projection(project.id).await?;
        let filtered = FieldValueFilter::filter(&projection, raw)?;
        task.apply_fields(filtered, &projection, &*self.clock)?;
        self.commit(&mut task, &project, actor).await
    }

    /// Applies a partial team update.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is missing or storage fails.
    pub async fn change_team(
        &self,
        id: TaskId,
        change: TeamChange,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let (mut task, project) = self.load_with_project(id).await?;
        task.patch_team(change, &*self.clock);
        self.commit(&mut task, &project, actor).await
    }

    /// Re-parents a task, or makes it a root when `parent` is `None`.
    ///
    /// Every descendant keeps its lineage below the task and takes the
    /// task's new ancestry above it. The task, its descendants and their
    /// `task_parent` activities are written in one unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::ParentNotFound`] for unknown parents, and
    /// a domain error for self-parenting or cycles.
    pub async fn change_parent(
        &self,
        id: TaskId,
        parent: Option<TaskId>,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let (mut task, project) = self.load_with_project(id).await?;
        let parent_task = match parent {
            Some(parent_id) if parent_id == id => {
                return Err(TaskDomainError::SelfParent(id).into());
            }
            Some(parent_id) => {
                let found = self
                    .repository
                    .find_by_id(parent_id)
                    .await?
                    .ok_or(TaskServiceError::ParentNotFound(parent_id))?;
                self.repository.check_path(found.path()).await?;
                Some(found)
            }
            None => None,
        };
        let previous = task.path().to_vec();
        task.patch_parent(parent_task.as_ref(), &*self.clock)?;
        if task.path() == previous.as_slice() {
            return Ok(Vec::new());
        }
        let mut subtree = self.repository.subtree_of(id).await?;
        subtree.retain_mut(|descendant| descendant.rebase_path(id, task.path(), &*self.clock));
        tracing::debug!(task = %id, descendants = subtree.len(), "subtree re-rooted");
        self.commit_subtree(task, project, subtree, actor).await
    }

    /// Moves a task into another project of the same company.
    ///
    /// Values of fields the target project does not project are removed
    /// and journalled as field changes.
    ///
    /// When the request names a status different from the current one, the
    /// status change is checked against the target project's workflow and
    /// required fields.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the target project is unknown or
    /// foreign, or the status change is refused; nothing is written then.
    pub async fn move_to_project(
        &self,
        id: TaskId,
        request: MoveTaskRequest,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let mut task = self.load_task(id).await?;
        let target = self.load_project(request.project).await?;
        let source = self.projection(task.project()).await?;
        task.move_to_project(&target, &*self.clock)?;
        let projection = self.projection(target.id).await?;
        let dropped = task.retain_projected(&source, &projection, &*self.clock);
        if !dropped.is_empty() {
            tracing::debug!(task = %id, ?dropped, "values of unprojected fields dropped");
        }
        if let Some(status) = request.status.filter(|status| *status != task.status()) {
            let change = StatusChange::new(status, actor.clone()).with_comment(request.comment);
            self.apply_status(&mut task, &target, &projection, change)?;
        }
        self.commit(&mut task, &target, actor).await
    }

    /// Soft-deletes a task and records a deletion activity.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is missing or
    /// already deleted.
    pub async fn delete_task(&self, id: TaskId, actor: &Actor) -> TaskServiceResult<Vec<Activity>> {
        let (mut task, project) = self.load_with_project(id).await?;
        task.soft_delete(&*self.clock);
        self.commit(&mut task, &project, actor).await
    }

    /// Restores a soft-deleted task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task never existed.
    pub async fn restore_task(
        &self,
        id: TaskId,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let mut task = self
            .repository
            .find_by_id_with_deleted(id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        let project = self.load_project(task.project()).await?;
        task.restore(&*self.clock);
        self.commit(&mut task, &project, actor).await
    }

    /// Removes one entry from a task's status history.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the entry does not exist.
    pub async fn delete_stop(&self, id: TaskId, stop: StopId) -> TaskServiceResult<()> {
        let mut task = self.load_task(id).await?;
        let write = task.delete_stop(stop)?;
        self.repository
            .change_field(id, write, self.clock.utc())
            .await?;
        self.publish(id).await;
        Ok(())
    }

    /// Records the first time `user` opened a task.
    ///
    /// Returns `true` when this was the user's first open.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is missing.
    pub async fn mark_opened(&self, id: TaskId, user: UserId) -> TaskServiceResult<bool> {
        let mut task = self.load_task(id).await?;
        let Some(write) = task.mark_opened(user, &*self.clock) else {
            return Ok(false);
        };
        self.repository
            .change_field(id, write, self.clock.utc())
            .await?;
        self.publish(id).await;
        Ok(true)
    }

    /// Stamps `activity_at` without recording an activity, e.g. after a
    /// comment is posted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is missing.
    pub async fn bump_activity(&self, id: TaskId) -> TaskServiceResult<()> {
        let now = self.clock.utc();
        self.repository
            .change_field(id, TaskColumnWrite::ActivityAt(now), now)
            .await?;
        self.publish(id).await;
        Ok(())
    }

    /// Records that an attachment was removed from a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is missing or the journal
    /// rejects the entry.
    pub async fn record_file_deleted(
        &self,
        id: TaskId,
        actor: &Actor,
        meta: &FileDeletedMeta,
    ) -> TaskServiceResult<Activity> {
        let task = self.load_task(id).await?;
        let activity = file_deleted(&task, actor, meta, self.clock.utc())?;
        self.activities
            .append(std::slice::from_ref(&activity))
            .await?;
        self.publish(id).await;
        Ok(activity)
    }

    /// Lists a task's journal oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when storage fails.
    pub async fn list_activities(
        &self,
        id: TaskId,
        page: ActivityPage,
    ) -> TaskServiceResult<ActivitySlice> {
        Ok(self.activities.list_for_entity(id, page).await?)
    }

    /// Lists the live descendants of a task, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when storage fails.
    pub async fn children(&self, id: TaskId) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repository.children_of(id).await?)
    }

    /// Resolves the display name and color of a task's priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task or its project is missing.
    pub async fn task_priority(&self, id: TaskId) -> TaskServiceResult<PriorityView> {
        let (task, project) = self.load_with_project(id).await?;
        Ok(task.priority().resolve(&project.priorities))
    }

    fn apply_status(
        &self,
        task: &mut Task,
        project: &Project,
        projection: &[ProjectFieldView],
        change: StatusChange,
    ) -> TaskServiceResult<StatusChangeOutcome> {
        let target = change.target;
        RequiredFieldsCheck::verify(projection, task.fields(), target)?;
        let transition =
            task.patch_status(change, project, self.validator.language(), &*self.clock)?;
        Ok(StatusChangeOutcome {
            stop_id: transition.stop,
            path: transition.path,
            status: target,
        })
    }

    fn journal(
        &self,
        task: &mut Task,
        project: &Project,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let entries = task.take_dirty();
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let journal = TaskJournal::new(task, project, actor, self.validator.language());
        Ok(journal.record(entries).inspect_err(|err| {
            tracing::error!(task = %task.id(), error = %err, "activity payload rejected");
        })?)
    }

    async fn commit_subtree(
        &self,
        mut task: Task,
        project: Project,
        subtree: Vec<Task>,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        let mut activities = self.journal(&mut task, &project, actor)?;
        let mut projects = HashMap::from([(project.id, project)]);
        let mut tasks = Vec::with_capacity(subtree.len() + 1);
        tasks.push(task);
        for mut descendant in subtree {
            let owner = match projects.get(&descendant.project()) {
                Some(found) => found.clone(),
                None => {
                    let found = self.load_project(descendant.project()).await?;
                    projects.insert(found.id, found.clone());
                    found
                }
            };
            activities.extend(self.journal(&mut descendant, &owner, actor)?);
            tasks.push(descendant);
        }
        self.repository
            .flush_all(&tasks, &activities)
            .await
            .inspect_err(|err| {
                if err.kind() == ErrorKind::Internal {
                    tracing::error!(error = %err, "subtree flush failed");
                }
            })?;
        for written in &tasks {
            self.publish(written.id()).await;
        }
        Ok(activities)
    }

    async fn commit(
        &self,
        task: &mut Task,
        project: &Project,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Activity>> {
        if task.dirty().is_empty() {
            return Ok(Vec::new());
        }
        let activities = self.journal(task, project, actor)?;
        self.repository.flush(task, &activities).await.inspect_err(|err| {
            if err.kind() == ErrorKind::Internal {
                tracing::error!(task = %task.id(), error = %err, "task flush failed");
            }
        })?;
        tracing::debug!(task = %task.id(), activities = activities.len(), "task flushed");
        self.publish(task.id()).await;
        Ok(activities)
    }

    async fn load_task(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    async fn load_project(&self, id: ProjectId) -> TaskServiceResult<Project> {
        self.repository
            .find_project(id)
            .await?
            .ok_or(TaskServiceError::ProjectNotFound(id))
    }

    async fn load_with_project(&self, id: TaskId) -> TaskServiceResult<(Task, Project)> {
        let task = self.load_task(id).await?;
        let project = self.load_project(task.project()).await?;
        Ok((task, project))
    }

    async fn projection(&self, project: ProjectId) -> TaskServiceResult<Vec<ProjectFieldView>> {
        Ok(self.schema.list_project_fields(project).await?)
    }

    async fn publish(&self, id: TaskId) {
        self.feed
            .publish(ChangeEvent::new(ChangedEntity::Task, id))
            .await;
    }
}
