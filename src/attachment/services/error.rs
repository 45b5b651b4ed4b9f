//! Service-level errors for attachment operations.

use crate::attachment::{
    domain::{AttachmentDomainError, ObjectKey},
    ports::{FileRepositoryError, ObjectStoreError},
};
use crate::shared::{Classify, ErrorKind, FileId, UserId};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Result type for attachment service operations.
pub type AttachmentServiceResult<T> = Result<T, AttachmentServiceError>;

/// Errors returned by the pipeline and the attachment service.
#[derive(Debug, Error)]
pub enum AttachmentServiceError {
    /// Probing, resizing, or naming failed.
    #[error(transparent)]
    Domain(#[from] AttachmentDomainError),

    /// The object store failed.
    #[error(transparent)]
    Store(#[from] ObjectStoreError),

    /// File record persistence failed.
    #[error(transparent)]
    Files(#[from] FileRepositoryError),

    /// The file is unknown or removed.
    #[error("file not found: {0}")]
    FileNotFound(FileId),

    /// Not every rendition finished before the deadline.
    #[error("upload photo timeout: ({path}) ({user})")]
    Timeout {
        /// Uploaded file.
        path: Utf8PathBuf,
        /// Photo owner.
        user: UserId,
    },

    /// Some photo renditions could not be removed.
    #[error("failed to delete {} photo rendition(s)", failures.len())]
    PhotoDeletion {
        /// Keys that failed with their errors.
        failures: Vec<(ObjectKey, ObjectStoreError)>,
    },

    /// The pipeline was stopped or a worker went away.
    #[error("attachment pipeline is not running")]
    Stopped,
}

impl Classify for AttachmentServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Store(err) => err.kind(),
            Self::Files(err) => err.kind(),
            Self::FileNotFound(_) => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::PhotoDeletion { .. } => ErrorKind::Transient,
            Self::Stopped => ErrorKind::Internal,
        }
    }
}
