//! In-memory activity journal.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::activity::{
    domain::Activity,
    ports::{
        ActivityPage, ActivityRepository, ActivityRepositoryError, ActivityRepositoryResult,
        ActivitySlice,
    },
};
use crate::shared::TaskId;

/// Thread-safe in-memory activity journal.
///
/// Clones share storage, so a task repository can append inside its own
/// write.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityRepository {
    state: Arc<RwLock<Vec<Activity>>>,
}

impl InMemoryActivityRepository {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ActivityRepositoryResult<RwLockReadGuard<'_, Vec<Activity>>> {
        self.state.read().map_err(|err| {
            ActivityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ActivityRepositoryResult<RwLockWriteGuard<'_, Vec<Activity>>> {
        self.state.write().map_err(|err| {
            ActivityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    /// Appends all entries or none.
    pub(crate) fn append_all(&self, activities: &[Activity]) -> ActivityRepositoryResult<()> {
        let mut journal = self.write()?;
        let mut seen: HashSet<_> = journal.iter().map(|stored| stored.id).collect();
        for activity in activities {
            if !seen.insert(activity.id) {
                return Err(ActivityRepositoryError::Duplicate(activity.id));
            }
        }
        journal.extend(activities.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn append(&self, activities: &[Activity]) -> ActivityRepositoryResult<()> {
        self.append_all(activities)
    }

    async fn list_for_entity(
        &self,
        entity: TaskId,
        page: ActivityPage,
    ) -> ActivityRepositoryResult<ActivitySlice> {
        let journal = self.read()?;
        let mut matching: Vec<&Activity> = journal
            .iter()
            .filter(|activity| activity.entity == entity)
            .collect();
        matching.sort_by_key(|activity| activity.created_at);

        let total = u64::try_from(matching.len()).map_err(ActivityRepositoryError::persistence)?;
        let offset = usize::try_from(page.offset).map_err(ActivityRepositoryError::persistence)?;
        let limit = usize::try_from(page.limit).map_err(ActivityRepositoryError::persistence)?;
        let activities = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(ActivitySlice { activities, total })
    }
}
