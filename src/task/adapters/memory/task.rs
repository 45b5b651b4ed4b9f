//! In-memory repositories for task lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::activity::{adapters::memory::InMemoryActivityRepository, domain::Activity};
use crate::schema::{
    domain::{FieldHash, FieldUsageCounts, is_empty_value},
    ports::{FieldSchemaRepositoryError, FieldSchemaRepositoryResult, FieldUsageReader},
};
use crate::shared::{ProjectId, TaskId};
use crate::task::{
    domain::{Project, Task, TaskColumnWrite},
    ports::{ProjectRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Flushes append to the shared activity journal while holding the task
/// write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
    journal: InMemoryActivityRepository,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    projects: HashMap<ProjectId, Project>,
    last_number: i64,
}

impl InMemoryTaskRepository {
    /// Creates a repository with its own journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository appending to `journal`.
    #[must_use]
    pub fn with_journal(journal: InMemoryActivityRepository) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    /// Returns the journal flushes append to.
    #[must_use]
    pub const fn journal(&self) -> &InMemoryActivityRepository {
        &self.journal
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<i64> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.last_number += 1;
        let number = state.last_number;
        let mut stored = task.clone();
        stored.assign_number(number);
        state.tasks.insert(task.id(), stored);
        Ok(number)
    }

    async fn flush(&self, task: &Task, activities: &[Activity]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        self.journal.append_all(activities)?;
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn flush_all(&self, tasks: &[Task], activities: &[Activity]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if let Some(missing) = tasks.iter().find(|task| !state.tasks.contains_key(&task.id())) {
            return Err(TaskRepositoryError::NotFound(missing.id()));
        }
        self.journal.append_all(activities)?;
        for task in tasks {
            state.tasks.insert(task.id(), task.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).filter(|task| task.is_live()).cloned())
    }

    async fn find_by_id_with_deleted(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn change_field(
        &self,
        id: TaskId,
        write: TaskColumnWrite,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        task.apply_column(write, now);
        Ok(())
    }

    async fn children_of(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut children: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.is_live() && task.id() != id && task.path().contains(&id))
            .cloned()
            .collect();
        children.sort_by_key(|task| (task.path().len(), task.number()));
        Ok(children)
    }

    async fn subtree_of(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut subtree: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.id() != id && task.path().contains(&id))
            .cloned()
            .collect();
        subtree.sort_by_key(|task| (task.path().len(), task.number()));
        Ok(subtree)
    }

    async fn check_path(&self, path: &[TaskId]) -> TaskRepositoryResult<()> {
        let state = self.read()?;
        path.iter()
            .find(|id| !state.tasks.get(id).is_some_and(Task::is_live))
            .map_or(Ok(()), |missing| Err(TaskRepositoryError::NotFound(*missing)))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryTaskRepository {
    async fn store_project(&self, project: &Project) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> TaskRepositoryResult<Option<Project>> {
        let state = self.read()?;
        Ok(state.projects.get(&id).cloned())
    }
}

#[async_trait]
impl FieldUsageReader for InMemoryTaskRepository {
    async fn field_usage(
        &self,
        projects: &[ProjectId],
        hash: &FieldHash,
    ) -> FieldSchemaRepositoryResult<FieldUsageCounts> {
        let state = self
            .read()
            .map_err(FieldSchemaRepositoryError::persistence)?;
        let mut counts = FieldUsageCounts::default();
        for task in state
            .tasks
            .values()
            .filter(|task| task.is_live() && projects.contains(&task.project()))
        {
            counts.tally(
                !is_empty_value(task.fields().get(hash.as_str())),
                task.is_active(),
            );
        }
        Ok(counts)
    }
}
