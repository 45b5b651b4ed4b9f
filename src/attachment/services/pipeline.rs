//! Photo pipeline: bounded resize and upload worker pools.
//!
//! A photo upload becomes one job per [`Rendition`]. Jobs enter the resize
//! queue, resized copies move to the upload queue, and every job ends by
//! counting down the [`CompletionLatch`] its caller waits on. Worker failures
//! are also forwarded to a single logger task.

use super::{
    AttachmentServiceError, AttachmentServiceResult, CompletionLatch, LatchFailure, ensure_bucket,
};
use crate::attachment::{
    domain::{self, AttachmentDomainError, File, FileOwner, MAX_FILE_NAME_LEN, ObjectKey, Rendition},
    ports::{FileRepository, ObjectStore},
};
use crate::config::{AttachmentConfig, ObjectStoreConfig};
use crate::shared::{Actor, UserId};
use camino::{Utf8Path, Utf8PathBuf};
use mockable::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;

/// Sizing of the worker pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of resize workers.
    pub parallel_resize: usize,
    /// Number of upload workers.
    pub parallel_upload: usize,
    /// Capacity of each work queue.
    pub queue_capacity: usize,
    /// How long a caller waits for every rendition.
    pub upload_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AttachmentConfig::default())
    }
}

impl From<&AttachmentConfig> for PipelineConfig {
    fn from(config: &AttachmentConfig) -> Self {
        Self {
            parallel_resize: config.parallel_resize.max(1),
            parallel_upload: config.parallel_upload.max(1),
            queue_capacity: config.queue_capacity.max(1),
            upload_timeout: config.upload_timeout(),
        }
    }
}

/// Bucket coordinates used by the pipeline and the attachment service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BucketSettings {
    /// Bucket receiving every object.
    pub bucket: String,
    /// Region passed when the bucket is created.
    pub location: String,
    /// Store host name; public photo links are `https://<bucket>.<endpoint>`.
    pub endpoint: String,
    /// Backend base URL for non-previewable downloads.
    pub backend_url: String,
}

impl BucketSettings {
    /// Returns the public URL of an object.
    #[must_use]
    pub fn object_url(&self, key: &ObjectKey) -> String {
        format!("https://{}.{}/{key}", self.bucket, self.endpoint)
    }

    pub(crate) fn storage_location(&self) -> domain::StorageLocation {
        domain::StorageLocation {
            bucket: self.bucket.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

impl From<&ObjectStoreConfig> for BucketSettings {
    fn from(config: &ObjectStoreConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            location: config.location.clone(),
            endpoint: config.endpoint.clone(),
            backend_url: config.backend_url.clone(),
        }
    }
}

#[derive(Debug)]
struct PhotoJob {
    source: Utf8PathBuf,
    upload_from: Utf8PathBuf,
    user: UserId,
    actor: Actor,
    rendition: Rendition,
    latch: Arc<CompletionLatch>,
}

impl PhotoJob {
    fn fail(&self, errors: &mpsc::UnboundedSender<String>, err: AttachmentServiceError) {
        if errors.send(err.to_string()).is_err() {
            tracing::debug!("attachment error logger has stopped");
        }
        self.latch.count_down(Err(err));
    }
}

struct Stage<O, R, C> {
    store: Arc<O>,
    files: Arc<R>,
    clock: Arc<C>,
    bucket: BucketSettings,
    errors: mpsc::UnboundedSender<String>,
}

impl<O, R, C> Clone for Stage<O, R, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            files: Arc::clone(&self.files),
            clock: Arc::clone(&self.clock),
            bucket: self.bucket.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Photo upload pipeline with an explicit start and stop.
pub struct AttachmentPipeline<O, R, C>
where
    O: ObjectStore + 'static,
    R: FileRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<O>,
    files: Arc<R>,
    bucket: BucketSettings,
    config: PipelineConfig,
    inbox: Mutex<Option<mpsc::Sender<PhotoJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    clock: Arc<C>,
}

impl<O, R, C> AttachmentPipeline<O, R, C>
where
    O: ObjectStore + 'static,
    R: FileRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Spawns the worker pools and the error logger on the current runtime.
    #[must_use]
    pub fn start(
        config: PipelineConfig,
        store: Arc<O>,
        files: Arc<R>,
        clock: Arc<C>,
        bucket: BucketSettings,
    ) -> Self {
        let (inbox, resize_rx) = mpsc::channel::<PhotoJob>(config.queue_capacity.max(1));
        let (upload_tx, upload_rx) = mpsc::channel::<PhotoJob>(config.queue_capacity.max(1));
        let (error_tx, error_rx) = mpsc::unbounded_channel::<String>();

        let stage = Stage {
            store: Arc::clone(&store),
            files: Arc::clone(&files),
            clock: Arc::clone(&clock),
            bucket: bucket.clone(),
            errors: error_tx,
        };

        let mut workers = Vec::with_capacity(config.parallel_resize + config.parallel_upload + 1);
        workers.push(tokio::spawn(log_errors(error_rx)));

        let resize_rx = Arc::new(AsyncMutex::new(resize_rx));
        for worker in 0..config.parallel_resize.max(1) {
            workers.push(tokio::spawn(resize_worker(
                worker,
                Arc::clone(&resize_rx),
                upload_tx.clone(),
                stage.errors.clone(),
            )));
        }
        drop(upload_tx);

        let upload_rx = Arc::new(AsyncMutex::new(upload_rx));
        for worker in 0..config.parallel_upload.max(1) {
            workers.push(tokio::spawn(upload_worker(
                worker,
                Arc::clone(&upload_rx),
                stage.clone(),
            )));
        }

        tracing::info!(
            resize_workers = config.parallel_resize,
            upload_workers = config.parallel_upload,
            "attachment pipeline started"
        );
        Self {
            store,
            files,
            bucket,
            config,
            inbox: Mutex::new(Some(inbox)),
            workers: Mutex::new(workers),
            clock,
        }
    }

    /// Closes the inbox and waits for every worker to drain and exit.
    pub async fn stop(&self) {
        let inbox = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(inbox);
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in workers {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "attachment worker failed");
            }
        }
        tracing::info!("attachment pipeline stopped");
    }

    /// Returns `true` until [`AttachmentPipeline::stop`] is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the pool sizing.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Uploads every rendition of a user photo and waits for them.
    ///
    /// Workers keep draining after a timeout; their results are then only
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns a domain error when `path` is not an image,
    /// [`AttachmentServiceError::Timeout`] when the deadline passes first,
    /// and the first worker error when a rendition failed.
    pub async fn upload_photo(
        &self,
        path: &Utf8Path,
        user: UserId,
        actor: &Actor,
    ) -> AttachmentServiceResult<()> {
        let source = path.to_owned();
        let probe = run_stage({
            let target = source.clone();
            move || domain::probe(&target)
        })
        .await?;
        if !probe.is_image() {
            return Err(AttachmentDomainError::NotAnImage {
                path: source,
                mime: probe.mime().to_owned(),
            }
            .into());
        }

        let inbox = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(AttachmentServiceError::Stopped)?;
        let latch = Arc::new(CompletionLatch::new(Rendition::ALL.len()));
        for rendition in Rendition::ALL {
            let job = PhotoJob {
                source: source.clone(),
                upload_from: source.clone(),
                user,
                actor: actor.clone(),
                rendition,
                latch: Arc::clone(&latch),
            };
            inbox
                .send(job)
                .await
                .map_err(|_| AttachmentServiceError::Stopped)?;
        }

        latch
            .wait(self.config.upload_timeout)
            .await
            .map_err(|failure| match failure {
                LatchFailure::TimedOut => AttachmentServiceError::Timeout { path: source, user },
                LatchFailure::Failed(err) => err,
            })
    }

    /// Removes every rendition of a user photo in parallel and retires the
    /// user's photo records.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentServiceError::PhotoDeletion`] listing each key
    /// whose removal failed; records are kept in that case.
    pub async fn delete_photo(&self, user: UserId) -> AttachmentServiceResult<()> {
        let mut removals = tokio::task::JoinSet::new();
        for rendition in Rendition::ALL {
            let store = Arc::clone(&self.store);
            let bucket = self.bucket.bucket.clone();
            let key = ObjectKey::photo(user, rendition);
            removals.spawn(async move {
                tracing::debug!(key = %key, "deleting photo");
                let outcome = store.remove_object(&bucket, &key).await;
                (key, outcome)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = removals.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((key, Err(err))) => {
                    tracing::error!(key = %key, error = %err, "photo removal failed");
                    failures.push((key, err));
                }
                Err(err) => {
                    tracing::error!(error = %err, "photo removal task failed");
                    return Err(AttachmentServiceError::Stopped);
                }
            }
        }
        if !failures.is_empty() {
            failures.sort_by(|left, right| left.0.cmp(&right.0));
            return Err(AttachmentServiceError::PhotoDeletion { failures });
        }

        let at = self.clock.utc();
        for file in self.files.list_for_owner(FileOwner::User(user)).await? {
            self.files.mark_for_delete(file.id(), at).await?;
            self.files.mark_deleted(file.id(), at).await?;
        }
        Ok(())
    }

    /// Returns the public URL of a photo rendition.
    #[must_use]
    pub fn photo_url(&self, user: UserId, rendition: Rendition) -> String {
        self.bucket.object_url(&ObjectKey::photo(user, rendition))
    }

    /// Returns the 50 px photo URL.
    #[must_use]
    pub fn small_photo_url(&self, user: UserId) -> String {
        self.photo_url(user, Rendition::Small)
    }

    /// Returns the 200 px photo URL.
    #[must_use]
    pub fn medium_photo_url(&self, user: UserId) -> String {
        self.photo_url(user, Rendition::Medium)
    }

    /// Returns the 600 px photo URL.
    #[must_use]
    pub fn large_photo_url(&self, user: UserId) -> String {
        self.photo_url(user, Rendition::Large)
    }
}

async fn run_stage<F, T>(work: F) -> AttachmentServiceResult<T>
where
    F: FnOnce() -> Result<T, AttachmentDomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "attachment stage panicked");
            AttachmentServiceError::Stopped
        })?
        .map_err(AttachmentServiceError::from)
}

async fn log_errors(mut errors: mpsc::UnboundedReceiver<String>) {
    while let Some(message) = errors.recv().await {
        tracing::error!(error = %message, "attachment pipeline failure");
    }
}

async fn next_job(queue: &AsyncMutex<mpsc::Receiver<PhotoJob>>) -> Option<PhotoJob> {
    queue.lock().await.recv().await
}

async fn resize_worker(
    worker: usize,
    queue: Arc<AsyncMutex<mpsc::Receiver<PhotoJob>>>,
    uploads: mpsc::Sender<PhotoJob>,
    errors: mpsc::UnboundedSender<String>,
) {
    while let Some(mut job) = next_job(&queue).await {
        if job.rendition.is_resized() {
            let width = job.rendition.width();
            tracing::info!(worker, path = %job.source, width, "resizing");
            let source = job.source.clone();
            match run_stage(move || domain::resize(&source, width)).await {
                Ok(resized) => job.upload_from = resized,
                Err(err) => {
                    job.fail(&errors, err);
                    continue;
                }
            }
        }
        if let Err(rejected) = uploads.send(job).await {
            rejected.0.fail(&errors, AttachmentServiceError::Stopped);
        }
    }
    tracing::debug!(worker, "resize worker stopped");
}

async fn upload_worker<O, R, C>(
    worker: usize,
    queue: Arc<AsyncMutex<mpsc::Receiver<PhotoJob>>>,
    stage: Stage<O, R, C>,
) where
    O: ObjectStore,
    R: FileRepository,
    C: Clock + Send + Sync,
{
    while let Some(job) = next_job(&queue).await {
        tracing::info!(worker, path = %job.upload_from, width = job.rendition.width(), "uploading");
        match upload_rendition(&stage, &job).await {
            Ok(()) => {
                tracing::info!(worker, path = %job.upload_from, "uploaded");
                job.latch.count_down(Ok(()));
            }
            Err(err) => job.fail(&stage.errors, err),
        }
    }
    tracing::debug!(worker, "upload worker stopped");
}

async fn upload_rendition<O, R, C>(stage: &Stage<O, R, C>, job: &PhotoJob) -> AttachmentServiceResult<()>
where
    O: ObjectStore,
    R: FileRepository,
    C: Clock + Send + Sync,
{
    let target = job.upload_from.clone();
    let probe = run_stage(move || domain::probe(&target)).await?;
    let key = ObjectKey::photo(job.user, job.rendition);

    ensure_bucket(stage.store.as_ref(), &stage.bucket).await?;
    stage
        .store
        .put_object(&stage.bucket.bucket, &key, &job.upload_from, probe.mime())
        .await?;

    let file = File::new(
        FileOwner::User(job.user),
        &display_name(&job.source),
        key,
        &probe,
        stage.bucket.storage_location(),
        &job.actor,
        stage.clock.utc(),
    )?
    .resized(job.rendition.is_resized());
    stage.files.create(&file).await?;
    Ok(())
}

fn display_name(path: &Utf8Path) -> String {
    let stem: String = path
        .file_stem()
        .unwrap_or_default()
        .chars()
        .take(MAX_FILE_NAME_LEN)
        .collect();
    if stem.trim().is_empty() {
        "photo".to_owned()
    } else {
        stem
    }
}
