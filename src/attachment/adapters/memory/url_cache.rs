//! In-memory presigned URL cache with per-entry expiry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::attachment::ports::{PresignedUrlCache, UrlCacheError, UrlCacheResult};
use crate::shared::FileId;

/// Thread-safe in-memory URL cache.
#[derive(Debug, Clone)]
pub struct InMemoryUrlCache<C: Clock + Send + Sync> {
    entries: Arc<RwLock<HashMap<FileId, (String, DateTime<Utc>)>>>,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> InMemoryUrlCache<C> {
    /// Creates an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            entries: Arc::default(),
            clock,
        }
    }
}

fn cache_failure(err: &dyn std::fmt::Display) -> UrlCacheError {
    UrlCacheError::backend(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl<C: Clock + Send + Sync> PresignedUrlCache for InMemoryUrlCache<C> {
    async fn get(&self, id: FileId) -> UrlCacheResult<Option<String>> {
        let now = self.clock.utc();
        let entries = self.entries.read().map_err(|err| cache_failure(&err))?;
        Ok(entries
            .get(&id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(url, _)| url.clone()))
    }

    async fn put(&self, id: FileId, url: &str, ttl: Duration) -> UrlCacheResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        let lifetime = chrono::Duration::from_std(ttl).map_err(UrlCacheError::backend)?;
        let expires_at = self
            .clock
            .utc()
            .checked_add_signed(lifetime)
            .ok_or_else(|| cache_failure(&"url cache ttl overflows the calendar"))?;
        let mut entries = self.entries.write().map_err(|err| cache_failure(&err))?;
        entries.insert(id, (url.to_owned(), expires_at));
        Ok(())
    }

    async fn clear(&self, id: FileId) -> UrlCacheResult<()> {
        let mut entries = self.entries.write().map_err(|err| cache_failure(&err))?;
        entries.remove(&id);
        Ok(())
    }
}
