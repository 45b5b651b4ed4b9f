//! Application services for attachments.

mod error;
mod files;
mod latch;
mod pipeline;

pub use error::{AttachmentServiceError, AttachmentServiceResult};
pub use files::{AttachmentService, FileLink, PRESIGNED_URL_LIFETIME};
pub use latch::{CompletionLatch, LatchFailure};
pub use pipeline::{AttachmentPipeline, BucketSettings, PipelineConfig};

use crate::attachment::ports::{ObjectStore, ObjectStoreResult};

/// Creates the bucket unless it already exists.
///
/// # Errors
///
/// Returns the creation error when the bucket is still missing afterwards.
pub async fn ensure_bucket<O>(store: &O, settings: &BucketSettings) -> ObjectStoreResult<()>
where
    O: ObjectStore + ?Sized,
{
    match store.make_bucket(&settings.bucket, &settings.location).await {
        Ok(()) => {
            tracing::info!(bucket = %settings.bucket, "successfully created bucket");
            Ok(())
        }
        Err(err) => match store.bucket_exists(&settings.bucket).await {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(err),
        },
    }
}
