//! In-memory object store.

use async_trait::async_trait;
use camino::Utf8Path;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::attachment::{
    domain::{ObjectKey, local},
    ports::{ObjectStore, ObjectStoreError, ObjectStoreResult},
};

/// Object held by [`InMemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object contents.
    pub bytes: Vec<u8>,
    /// Declared content type.
    pub content_type: String,
}

type Buckets = HashMap<String, BTreeMap<String, StoredObject>>;

/// Thread-safe in-memory object store.
///
/// Presigned URLs are plain links under `base_url`.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore {
    state: Arc<RwLock<Buckets>>,
    base_url: String,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            state: Arc::default(),
            base_url: base_url.into(),
        }
    }

    /// Returns a stored object.
    ///
    /// # Errors
    ///
    /// Returns an error when the store lock is poisoned.
    pub fn object(&self, bucket: &str, key: &str) -> ObjectStoreResult<Option<StoredObject>> {
        let state = self.read()?;
        Ok(state
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned())
    }

    /// Lists the keys of a bucket in lexical order.
    ///
    /// # Errors
    ///
    /// Returns an error when the store lock is poisoned.
    pub fn keys(&self, bucket: &str) -> ObjectStoreResult<Vec<String>> {
        let state = self.read()?;
        Ok(state
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read(&self) -> ObjectStoreResult<RwLockReadGuard<'_, Buckets>> {
        self.state
            .read()
            .map_err(|err| ObjectStoreError::backend(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> ObjectStoreResult<RwLockWriteGuard<'_, Buckets>> {
        self.state
            .write()
            .map_err(|err| ObjectStoreError::backend(std::io::Error::other(err.to_string())))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn make_bucket(&self, bucket: &str, _location: &str) -> ObjectStoreResult<()> {
        let mut state = self.write()?;
        if state.contains_key(bucket) {
            return Err(ObjectStoreError::BucketExists(bucket.to_owned()));
        }
        state.insert(bucket.to_owned(), BTreeMap::new());
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool> {
        Ok(self.read()?.contains_key(bucket))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &ObjectKey,
        source: &Utf8Path,
        content_type: &str,
    ) -> ObjectStoreResult<u64> {
        let path = source.to_owned();
        let bytes = tokio::task::spawn_blocking(move || local::read_file(&path))
            .await
            .map_err(ObjectStoreError::backend)?
            .map_err(ObjectStoreError::backend)?;
        let size = u64::try_from(bytes.len()).map_err(ObjectStoreError::backend)?;

        let mut state = self.write()?;
        let objects = state
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::NoSuchBucket(bucket.to_owned()))?;
        objects.insert(
            key.as_str().to_owned(),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(size)
    }

    async fn remove_object(&self, bucket: &str, key: &ObjectKey) -> ObjectStoreResult<()> {
        let mut state = self.write()?;
        let objects = state
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::NoSuchBucket(bucket.to_owned()))?;
        objects.remove(key.as_str());
        Ok(())
    }

    async fn presigned_get_object(
        &self,
        bucket: &str,
        key: &ObjectKey,
        expires: Duration,
        download_name: &str,
    ) -> ObjectStoreResult<String> {
        if !self.read()?.contains_key(bucket) {
            return Err(ObjectStoreError::NoSuchBucket(bucket.to_owned()));
        }
        Ok(format!(
            "{base}/{bucket}/{key}?expires={secs}&filename={download_name}",
            base = self.base_url,
            secs = expires.as_secs()
        ))
    }
}
