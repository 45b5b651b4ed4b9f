//! In-memory file record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::attachment::{
    domain::{File, FileOwner},
    ports::{FileRepository, FileRepositoryError, FileRepositoryResult},
};
use crate::shared::FileId;

/// Thread-safe in-memory file repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileRepository {
    state: Arc<RwLock<HashMap<FileId, File>>>,
}

impl InMemoryFileRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a record regardless of removal state.
    ///
    /// # Errors
    ///
    /// Returns an error when the repository lock is poisoned.
    pub fn find_with_deleted(&self, id: FileId) -> FileRepositoryResult<Option<File>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn read(&self) -> FileRepositoryResult<RwLockReadGuard<'_, HashMap<FileId, File>>> {
        self.state
            .read()
            .map_err(|err| FileRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> FileRepositoryResult<RwLockWriteGuard<'_, HashMap<FileId, File>>> {
        self.state
            .write()
            .map_err(|err| FileRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn create(&self, file: &File) -> FileRepositoryResult<()> {
        let mut state = self.write()?;
        if state.contains_key(&file.id()) {
            return Err(FileRepositoryError::Duplicate(file.id()));
        }
        state.insert(file.id(), file.clone());
        Ok(())
    }

    async fn find(&self, id: FileId) -> FileRepositoryResult<Option<File>> {
        Ok(self.read()?.get(&id).filter(|file| file.is_live()).cloned())
    }

    async fn list_for_owner(&self, owner: FileOwner) -> FileRepositoryResult<Vec<File>> {
        let state = self.read()?;
        let mut files: Vec<File> = state
            .values()
            .filter(|file| file.is_live() && file.owner() == owner)
            .cloned()
            .collect();
        files.sort_by_key(File::created_at);
        Ok(files)
    }

    async fn mark_for_delete(&self, id: FileId, at: DateTime<Utc>) -> FileRepositoryResult<()> {
        let mut state = self.write()?;
        let file = state
            .get_mut(&id)
            .ok_or(FileRepositoryError::NotFound(id))?;
        file.mark_for_delete(at);
        Ok(())
    }

    async fn mark_deleted(&self, id: FileId, at: DateTime<Utc>) -> FileRepositoryResult<()> {
        let mut state = self.write()?;
        let file = state
            .get_mut(&id)
            .filter(|file| file.is_live())
            .ok_or(FileRepositoryError::NotFound(id))?;
        file.mark_deleted(at);
        Ok(())
    }

    async fn rename(&self, id: FileId, name: &str) -> FileRepositoryResult<()> {
        let mut state = self.write()?;
        let file = state
            .get_mut(&id)
            .filter(|file| file.is_live())
            .ok_or(FileRepositoryError::NotFound(id))?;
        file.rename(name)
            .map_err(|err| FileRepositoryError::Corrupt(err.to_string()))
    }
}
