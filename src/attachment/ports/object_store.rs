//! Port for an S3-compatible object store.

use crate::attachment::domain::ObjectKey;
use crate::shared::{Classify, ErrorKind};
use async_trait::async_trait;
use camino::Utf8Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for object store operations.
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Bucket-level object storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates a bucket.
    ///
    /// # Errors
    ///
    /// Fails when the bucket already exists or cannot be created; callers
    /// confirm with [`ObjectStore::bucket_exists`].
    async fn make_bucket(&self, bucket: &str, location: &str) -> ObjectStoreResult<()>;

    /// Returns `true` when the bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool>;

    /// Uploads a local file under `key` and returns the stored size.
    async fn put_object(
        &self,
        bucket: &str,
        key: &ObjectKey,
        source: &Utf8Path,
        content_type: &str,
    ) -> ObjectStoreResult<u64>;

    /// Removes an object; removing a missing object succeeds.
    async fn remove_object(&self, bucket: &str, key: &ObjectKey) -> ObjectStoreResult<()>;

    /// Returns a time-limited download URL that suggests `download_name`.
    async fn presigned_get_object(
        &self,
        bucket: &str,
        key: &ObjectKey,
        expires: Duration,
        download_name: &str,
    ) -> ObjectStoreResult<String>;
}

/// Errors returned by object store implementations.
#[derive(Debug, Clone, Error)]
pub enum ObjectStoreError {
    /// The bucket does not exist.
    #[error("bucket not found: {0}")]
    NoSuchBucket(String),

    /// The bucket already exists.
    #[error("bucket already exists: {0}")]
    BucketExists(String),

    /// The store rejected or failed the request.
    #[error("object store error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl ObjectStoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

impl Classify for ObjectStoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSuchBucket(_) => ErrorKind::NotFound,
            Self::BucketExists(_) => ErrorKind::Conflict,
            Self::Backend(_) => ErrorKind::Transient,
        }
    }
}
