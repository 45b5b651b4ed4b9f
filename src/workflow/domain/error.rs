//! Error types for status graph construction.

use crate::shared::{Classify, ErrorKind};
use thiserror::Error;

/// Errors returned while building a [`super::StatusGraph`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusGraphError {
    /// The JSON document is not an object of string arrays.
    #[error("malformed status graph json: {0}")]
    Malformed(String),

    /// A label is neither `*` nor a decimal status in `0..=20`.
    #[error("invalid status label '{0}', expected '*' or an integer in 0..=20")]
    InvalidLabel(String),
}

impl Classify for StatusGraphError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed(_) => ErrorKind::Internal,
            Self::InvalidLabel(_) => ErrorKind::Validation,
        }
    }
}
