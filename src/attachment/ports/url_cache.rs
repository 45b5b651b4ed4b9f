//! Port memoising presigned download URLs.

use crate::shared::FileId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for URL cache operations.
pub type UrlCacheResult<T> = Result<T, UrlCacheError>;

/// Key-value store of presigned URLs keyed by file.
#[async_trait]
pub trait PresignedUrlCache: Send + Sync {
    /// Returns an unexpired URL.
    async fn get(&self, id: FileId) -> UrlCacheResult<Option<String>>;

    /// Stores a URL for `ttl`; a zero `ttl` stores nothing.
    async fn put(&self, id: FileId, url: &str, ttl: Duration) -> UrlCacheResult<()>;

    /// Forgets the URL of a file.
    async fn clear(&self, id: FileId) -> UrlCacheResult<()>;
}

/// Errors returned by URL cache implementations.
#[derive(Debug, Clone, Error)]
#[error("url cache error: {0}")]
pub struct UrlCacheError(Arc<dyn std::error::Error + Send + Sync>);

impl UrlCacheError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
