//! Task and comment attachments: upload, removal, renaming, and listing with
//! presigned preview links.

use super::{AttachmentServiceError, AttachmentServiceResult, BucketSettings, ensure_bucket};
use crate::attachment::{
    domain::{self, File, FileOwner, ObjectKey, is_previewable_mime, validate_name},
    ports::{FileRepository, FileRepositoryError, ObjectStore, PresignedUrlCache},
};
use crate::shared::{
    Actor, ChangeEvent, ChangeFeed, ChangedEntity, CommentId, FederationId, FileId, TaskId, UserId,
};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Lifetime of presigned download links.
pub const PRESIGNED_URL_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// File as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLink {
    /// File identifier.
    pub id: FileId,
    /// Display name.
    pub name: String,
    /// Extension with its dot.
    pub ext: String,
    /// Size in bytes.
    pub size: u64,
    /// Presigned link for previews, backend download route otherwise.
    pub url: String,
    /// Upload time.
    pub created_at: DateTime<Utc>,
    /// Uploading user.
    pub created_by: UserId,
}

/// Attachment service for task and comment files.
#[derive(Clone)]
pub struct AttachmentService<O, R, U, F, C>
where
    O: ObjectStore,
    R: FileRepository,
    U: PresignedUrlCache,
    F: ChangeFeed,
    C: Clock + Send + Sync,
{
    store: Arc<O>,
    files: Arc<R>,
    cache: Arc<U>,
    feed: Arc<F>,
    clock: Arc<C>,
    bucket: BucketSettings,
    cache_ttl: Duration,
}

impl<O, R, U, F, C> AttachmentService<O, R, U, F, C>
where
    O: ObjectStore,
    R: FileRepository,
    U: PresignedUrlCache,
    F: ChangeFeed,
    C: Clock + Send + Sync,
{
    /// Creates a service; a zero `cache_ttl` disables URL memoisation.
    #[must_use]
    pub const fn new(
        store: Arc<O>,
        files: Arc<R>,
        cache: Arc<U>,
        feed: Arc<F>,
        clock: Arc<C>,
        bucket: BucketSettings,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            files,
            cache,
            feed,
            clock,
            bucket,
            cache_ttl,
        }
    }

    /// Stores a task attachment under `<federation>/task/<task>/<uuid><ext>`.
    ///
    /// # Errors
    ///
    /// Returns a domain error for unreadable files or invalid names, and
    /// store or repository errors when either write fails.
    pub async fn upload_task_file(
        &self,
        federation: FederationId,
        task: TaskId,
        file_name: &str,
        path: &Utf8Path,
        actor: &Actor,
    ) -> AttachmentServiceResult<File> {
        self.upload(FileOwner::Task(task), federation, task, file_name, path, actor)
            .await
    }

    /// Stores a comment attachment under its task's prefix.
    ///
    /// # Errors
    ///
    /// Same as [`AttachmentService::upload_task_file`].
    pub async fn upload_comment_file(
        &self,
        federation: FederationId,
        task: TaskId,
        comment: CommentId,
        file_name: &str,
        path: &Utf8Path,
        actor: &Actor,
    ) -> AttachmentServiceResult<File> {
        self.upload(FileOwner::Comment(comment), federation, task, file_name, path, actor)
            .await
    }

    /// Removes a file: stamps `to_deleted_at`, removes the object, then
    /// stamps `deleted_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentServiceError::FileNotFound`] for unknown or
    /// removed files, and store errors when the object survives; the record
    /// then stays marked for deletion.
    pub async fn delete_file(&self, id: FileId) -> AttachmentServiceResult<()> {
        let file = self.load(id).await?;
        self.files.mark_for_delete(id, self.clock.utc()).await?;
        self.store
            .remove_object(&file.location().bucket, file.object_key())
            .await?;
        self.files.mark_deleted(id, self.clock.utc()).await?;
        self.forget_url(id).await;
        tracing::debug!(file = %id, key = %file.object_key(), "deleted file");
        self.publish(id).await;
        Ok(())
    }

    /// Renames a live file.
    ///
    /// # Errors
    ///
    /// Returns a domain error for empty or overlong names and
    /// [`AttachmentServiceError::FileNotFound`] for unknown files.
    pub async fn rename_file(&self, id: FileId, name: &str) -> AttachmentServiceResult<()> {
        let cleaned = validate_name(name)?;
        self.files.rename(id, &cleaned).await.map_err(|err| match err {
            FileRepositoryError::NotFound(missing) => {
                AttachmentServiceError::FileNotFound(missing)
            }
            other => other.into(),
        })?;
        self.forget_url(id).await;
        self.publish(id).await;
        Ok(())
    }

    /// Lists a task's live files.
    ///
    /// With `open_images`, previewable files link to presigned URLs.
    ///
    /// # Errors
    ///
    /// Returns repository errors; presigning failures fall back to the
    /// backend route.
    pub async fn task_files(
        &self,
        task: TaskId,
        open_images: bool,
    ) -> AttachmentServiceResult<Vec<FileLink>> {
        self.links(FileOwner::Task(task), open_images).await
    }

    /// Lists a comment's live files.
    ///
    /// # Errors
    ///
    /// Same as [`AttachmentService::task_files`].
    pub async fn comment_files(
        &self,
        comment: CommentId,
        open_images: bool,
    ) -> AttachmentServiceResult<Vec<FileLink>> {
        self.links(FileOwner::Comment(comment), open_images).await
    }

    /// Presigns a download link for a live file.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentServiceError::FileNotFound`] for unknown files and
    /// store errors when presigning fails.
    pub async fn presigned_url(&self, id: FileId) -> AttachmentServiceResult<String> {
        let file = self.load(id).await?;
        self.presign(&file).await
    }

    async fn upload(
        &self,
        owner: FileOwner,
        federation: FederationId,
        task: TaskId,
        file_name: &str,
        path: &Utf8Path,
        actor: &Actor,
    ) -> AttachmentServiceResult<File> {
        let source = path.to_owned();
        let probe = tokio::task::spawn_blocking(move || domain::probe(&source))
            .await
            .map_err(|_| AttachmentServiceError::Stopped)??;
        let key = ObjectKey::attachment(federation, task, probe.ext());
        let file = File::new(
            owner,
            file_name,
            key,
            &probe,
            self.bucket.storage_location(),
            actor,
            self.clock.utc(),
        )?;

        ensure_bucket(self.store.as_ref(), &self.bucket).await?;
        let size = self
            .store
            .put_object(&self.bucket.bucket, file.object_key(), path, file.mime())
            .await?;
        if let Err(err) = self.files.create(&file).await {
            if let Err(cleanup) = self
                .store
                .remove_object(&self.bucket.bucket, file.object_key())
                .await
            {
                tracing::warn!(key = %file.object_key(), error = %cleanup, "orphaned object");
            }
            return Err(err.into());
        }
        tracing::debug!(file = %file.id(), key = %file.object_key(), size, "uploaded file");
        self.publish(file.id()).await;
        Ok(file)
    }

    async fn links(
        &self,
        owner: FileOwner,
        open_images: bool,
    ) -> AttachmentServiceResult<Vec<FileLink>> {
        let files = self.files.list_for_owner(owner).await?;
        let mut links = Vec::with_capacity(files.len());
        for file in files {
            let url = if open_images && is_previewable_mime(file.mime()) {
                self.preview_url(&file).await
            } else {
                self.backend_url(&file)
            };
            links.push(FileLink {
                id: file.id(),
                name: file.name().to_owned(),
                ext: file.ext().to_owned(),
                size: file.size(),
                url,
                created_at: file.created_at(),
                created_by: file.created_by(),
            });
        }
        Ok(links)
    }

    async fn preview_url(&self, file: &File) -> String {
        if !self.cache_ttl.is_zero() {
            match self.cache.get(file.id()).await {
                Ok(Some(url)) => return url,
                Ok(None) => tracing::debug!(file = %file.id(), "presigned url cache miss"),
                Err(err) => tracing::warn!(file = %file.id(), error = %err, "url cache read failed"),
            }
        }
        match self.presign(file).await {
            Ok(url) => {
                if !self.cache_ttl.is_zero() {
                    if let Err(err) = self.cache.put(file.id(), &url, self.cache_ttl).await {
                        tracing::warn!(file = %file.id(), error = %err, "url cache write failed");
                    }
                }
                url
            }
            Err(err) => {
                tracing::warn!(file = %file.id(), error = %err, "presigning failed");
                self.backend_url(file)
            }
        }
    }

    async fn presign(&self, file: &File) -> AttachmentServiceResult<String> {
        Ok(self
            .store
            .presigned_get_object(
                &file.location().bucket,
                file.object_key(),
                PRESIGNED_URL_LIFETIME,
                file.name(),
            )
            .await?)
    }

    fn backend_url(&self, file: &File) -> String {
        format!(
            "{}/task/{}/upload/{}",
            self.bucket.backend_url.trim_end_matches('/'),
            file.owner().id(),
            file.id()
        )
    }

    async fn load(&self, id: FileId) -> AttachmentServiceResult<File> {
        self.files
            .find(id)
            .await?
            .ok_or(AttachmentServiceError::FileNotFound(id))
    }

    async fn forget_url(&self, id: FileId) {
        if let Err(err) = self.cache.clear(id).await {
            tracing::warn!(file = %id, error = %err, "url cache clear failed");
        }
    }

    async fn publish(&self, id: FileId) {
        self.feed
            .publish(ChangeEvent::new(ChangedEntity::File, id))
            .await;
    }
}
