//! Error types for activity construction.

use crate::shared::{Classify, ErrorKind};
use thiserror::Error;

/// Errors raised while building or decoding activities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivityDomainError {
    /// Stored type code is not a known activity kind.
    #[error("unknown activity type code: {0}")]
    UnknownKind(i32),

    /// Metadata could not be encoded.
    #[error("activity metadata could not be encoded: {0}")]
    Meta(String),
}

impl Classify for ActivityDomainError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

impl From<serde_json::Error> for ActivityDomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Meta(err.to_string())
    }
}
