//! Error types for attachment probing, resizing, and file records.

use crate::shared::{Classify, ErrorKind};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by the attachment stage functions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachmentDomainError {
    /// A local file could not be read or written.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Local path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        message: String,
    },

    /// The file claims to be an image but cannot be decoded or encoded.
    #[error("failed to process image {path}: {message}")]
    Image {
        /// Local path.
        path: Utf8PathBuf,
        /// Underlying codec failure.
        message: String,
    },

    /// A photo upload received something other than an image.
    #[error("file is not image: {path} ({mime})")]
    NotAnImage {
        /// Local path.
        path: Utf8PathBuf,
        /// Sniffed MIME type.
        mime: String,
    },

    /// The path has no final component.
    #[error("path has no file name: {0}")]
    InvalidPath(Utf8PathBuf),

    /// Display names must be 1 to 50 characters after trimming.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
}

impl AttachmentDomainError {
    pub(crate) fn io(path: &camino::Utf8Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            message: err.to_string(),
        }
    }

    pub(crate) fn image(path: &camino::Utf8Path, err: &image::ImageError) -> Self {
        Self::Image {
            path: path.to_owned(),
            message: err.to_string(),
        }
    }
}

impl Classify for AttachmentDomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Internal,
            Self::Image { .. }
            | Self::NotAnImage { .. }
            | Self::InvalidPath(_)
            | Self::InvalidName(_) => ErrorKind::Validation,
        }
    }
}
