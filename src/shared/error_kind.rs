//! Language-independent error taxonomy.
//!
//! Every service error reports one of these kinds so that an outer transport
//! (HTTP, queue consumer) can choose a status code or retry policy without
//! matching on context-specific variants.

use std::fmt;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input out of range or of the wrong shape.
    Validation,
    /// No entity for the identifier, or the entity is soft-deleted.
    NotFound,
    /// Uniqueness violation or denied status transition.
    Conflict,
    /// A required field or mandatory comment is missing.
    Precondition,
    /// Persistence, cache, or object-store failure; retry may succeed.
    Transient,
    /// A deadline elapsed.
    Timeout,
    /// Invariant breach or malformed stored data.
    Internal,
}

impl ErrorKind {
    /// Returns `true` when the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::Timeout)
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Precondition => "precondition",
            Self::Transient => "transient",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can report their [`ErrorKind`].
pub trait Classify {
    /// Returns the coarse kind of this error.
    fn kind(&self) -> ErrorKind;
}
