//! Error types for field schema validation.

use crate::shared::{Classify, ErrorKind, Language, ValidationErrors};
use thiserror::Error;

/// Errors returned while constructing field schema values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaDomainError {
    /// One or more attributes failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A hand-supplied hash does not match `^[a-z_]{3,20}$`.
    #[error("invalid field hash '{0}'")]
    InvalidHash(String),

    /// The company field counter cannot be incremented.
    #[error("field counter overflow at {0}")]
    CounterOverflow(u64),

    /// Unknown data type code or name.
    #[error("unknown field data type '{0}'")]
    UnknownDataType(String),

    /// Style outside `""`, `hide_when_empty`, `show_when_empty`.
    #[error("invalid style '{0}', expected hide_when_empty or show_when_empty")]
    InvalidStyle(String),

    /// A required-on status lies outside `0..=10`.
    #[error("required status {0} is outside 0..=10")]
    InvalidRequiredStatus(i32),

    /// `data` and `data_array` fields need a catalog reference.
    #[error("data fields require a catalog reference")]
    MissingCatalogReference,

    /// A catalog field may not reference its own catalog.
    #[error("a field cannot reference its own catalog")]
    SelfCatalogReference,
}

impl Classify for SchemaDomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::CounterOverflow(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }
}

/// A projected field that must be filled before entering a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    /// Field hash.
    pub hash: String,
    /// Field display name.
    pub name: String,
}

/// Required-on-status check failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", render_missing(.fields, Language::En))]
pub struct MissingRequiredFields {
    /// Target status of the rejected change.
    pub status: i32,
    /// Every field left empty.
    pub fields: Vec<MissingField>,
}

impl MissingRequiredFields {
    /// Returns the hashes of the missing fields.
    #[must_use]
    pub fn hashes(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.hash.as_str()).collect()
    }

    /// Renders the list in `language`.
    #[must_use]
    pub fn message(&self, language: Language) -> String {
        render_missing(&self.fields, language)
    }
}

fn render_missing(fields: &[MissingField], language: Language) -> String {
    fields
        .iter()
        .map(|field| match language {
            Language::En => format!("field '{}' required", field.hash),
            Language::Ru => format!("поле '{}' обязательно", field.hash),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while coercing raw task field values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldValueError {
    /// The value has the wrong JSON type for the field.
    #[error("field {name} ({hash}) should be {expected}")]
    WrongType {
        /// Field display name.
        name: String,
        /// Field hash.
        hash: String,
        /// Expected shape.
        expected: &'static str,
    },

    /// The value has the right type but fails a content rule.
    #[error("field {name} ({hash}): {detail}")]
    InvalidValue {
        /// Field display name.
        name: String,
        /// Field hash.
        hash: String,
        /// What is wrong.
        detail: String,
    },

    /// Keys that are not projected onto the project.
    #[error("cannot add: ({})", .0.join(","))]
    NotProjected(Vec<String>),

    /// The project has no custom fields at all.
    #[error("project has no custom fields")]
    NoProjectFields,
}

impl Classify for FieldValueError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
