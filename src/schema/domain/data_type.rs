//! Closed set of dynamic field data types.

use super::SchemaDomainError;
use serde::{Deserialize, Serialize};

/// Data type of a company field, stored by its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataType {
    /// Whole number.
    Integer,
    /// Floating-point number.
    Float,
    /// Short string.
    String,
    /// Long text.
    Text,
    /// Boolean.
    Bool,
    /// Tri-state switch `0 | 1 | 2`.
    Switch,
    /// List of strings.
    Array,
    /// Reference to one catalog record.
    Data,
    /// References to several catalog records.
    DataArray,
    /// Phone number stored as an integer.
    Phone,
    /// Markdown link `[text](url)`.
    Link,
    /// Email address.
    Email,
    /// Time of day.
    Time,
    /// RFC 3339 instant.
    DateTime,
    /// List of user emails.
    People,
}

impl FieldDataType {
    /// Every data type in code order.
    pub const ALL: [Self; 15] = [
        Self::Integer,
        Self::Float,
        Self::String,
        Self::Text,
        Self::Bool,
        Self::Switch,
        Self::Array,
        Self::Data,
        Self::DataArray,
        Self::Phone,
        Self::Link,
        Self::Email,
        Self::Time,
        Self::DateTime,
        Self::People,
    ];

    /// Returns the stable storage code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Integer => 0,
            Self::Float => 1,
            Self::String => 2,
            Self::Text => 3,
            Self::Bool => 4,
            Self::Switch => 5,
            Self::Array => 6,
            Self::Data => 7,
            Self::DataArray => 8,
            Self::Phone => 9,
            Self::Link => 10,
            Self::Email => 11,
            Self::Time => 12,
            Self::DateTime => 13,
            Self::People => 14,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Switch => "switch",
            Self::Array => "array",
            Self::Data => "data",
            Self::DataArray => "data_array",
            Self::Phone => "phone",
            Self::Link => "link",
            Self::Email => "email",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::People => "people",
        }
    }

    /// Returns `true` for types whose values are sets.
    #[must_use]
    pub const fn is_set_valued(self) -> bool {
        matches!(self, Self::Array | Self::DataArray | Self::People)
    }

    /// Returns `true` for types that reference a catalog.
    #[must_use]
    pub const fn references_catalog(self) -> bool {
        matches!(self, Self::Data | Self::DataArray)
    }
}

impl TryFrom<i32> for FieldDataType {
    type Error = SchemaDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.code() == value)
            .ok_or_else(|| SchemaDomainError::UnknownDataType(value.to_string()))
    }
}

impl TryFrom<&str> for FieldDataType {
    type Error = SchemaDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == normalized)
            .ok_or_else(|| SchemaDomainError::UnknownDataType(value.to_owned()))
    }
}
