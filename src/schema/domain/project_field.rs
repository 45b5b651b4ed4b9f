//! Projection of company fields onto projects.

use super::{CompanyField, FieldDataType, FieldHash, SchemaDomainError};
use crate::shared::{CompanyFieldId, CompanyId, ProjectFieldId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Highest status a field can be required on.
pub const MAX_REQUIRED_STATUS: i32 = 10;

/// Display style of a projected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldStyle {
    /// No particular style (`""`).
    #[default]
    #[serde(rename = "")]
    Default,
    /// Hidden while empty.
    #[serde(rename = "hide_when_empty")]
    HideWhenEmpty,
    /// Shown even while empty.
    #[serde(rename = "show_when_empty")]
    ShowWhenEmpty,
}

impl FieldStyle {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::HideWhenEmpty => "hide_when_empty",
            Self::ShowWhenEmpty => "show_when_empty",
        }
    }
}

impl TryFrom<&str> for FieldStyle {
    type Error = SchemaDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "" => Ok(Self::Default),
            "hide_when_empty" => Ok(Self::HideWhenEmpty),
            "show_when_empty" => Ok(Self::ShowWhenEmpty),
            other => Err(SchemaDomainError::InvalidStyle(other.to_owned())),
        }
    }
}

/// Validates and normalizes a list of required statuses.
///
/// # Errors
///
/// Returns [`SchemaDomainError::InvalidRequiredStatus`] for the first status
/// outside `0..=10`.
pub fn required_statuses(
    statuses: impl IntoIterator<Item = i32>,
) -> Result<BTreeSet<i32>, SchemaDomainError> {
    statuses
        .into_iter()
        .map(|status| {
            if (0..=MAX_REQUIRED_STATUS).contains(&status) {
                Ok(status)
            } else {
                Err(SchemaDomainError::InvalidRequiredStatus(status))
            }
        })
        .collect()
}

/// Projection of one company field onto one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectField {
    /// Projection identifier.
    pub id: ProjectFieldId,
    /// Project receiving the field.
    pub project: ProjectId,
    /// Company owning both.
    pub company: CompanyId,
    /// Projected definition.
    pub company_field: CompanyFieldId,
    /// Statuses on which the field must be filled.
    pub required_on_statuses: BTreeSet<i32>,
    /// Display style.
    pub style: FieldStyle,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProjectField {
    /// Creates a live projection.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError`] for an unknown style or an out-of-range
    /// required status.
    pub fn new(
        project: ProjectId,
        company: CompanyId,
        company_field: CompanyFieldId,
        required_on_statuses: impl IntoIterator<Item = i32>,
        style: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SchemaDomainError> {
        Ok(Self {
            id: ProjectFieldId::new(),
            project,
            company,
            company_field,
            required_on_statuses: required_statuses(required_on_statuses)?,
            style: FieldStyle::try_from(style)?,
            created_at,
            deleted_at: None,
        })
    }

    /// Returns `true` when both projections carry the same attributes.
    #[must_use]
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.required_on_statuses == other.required_on_statuses && self.style == other.style
    }
}

/// Outcome of projecting a field onto a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFieldUpsert {
    /// A new projection was inserted.
    Created,
    /// An existing or previously removed projection was updated.
    Updated,
    /// A live projection with identical attributes already exists.
    Unchanged,
}

/// Company field joined with its projection attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFieldView {
    /// Projected definition.
    pub field: CompanyField,
    /// Statuses on which the field must be filled.
    pub required_on_statuses: BTreeSet<i32>,
    /// Display style.
    pub style: FieldStyle,
}

impl ProjectFieldView {
    /// Returns the field hash.
    #[must_use]
    pub const fn hash(&self) -> &FieldHash {
        self.field.hash()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Returns the value type.
    #[must_use]
    pub const fn data_type(&self) -> FieldDataType {
        self.field.data_type()
    }

    /// Returns `true` when the field is required on `status`.
    #[must_use]
    pub fn required_on(&self, status: i32) -> bool {
        self.required_on_statuses.contains(&status)
    }
}

/// Looks up a projected field by hash.
#[must_use]
pub fn find_projected<'a>(projection: &'a [ProjectFieldView], hash: &str) -> Option<&'a ProjectFieldView> {
    projection.iter().find(|view| view.hash().as_str() == hash)
}

/// Usage counters of one company field across the tasks of its projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldUsageCounts {
    /// Tasks in projects carrying the field.
    pub tasks_total: u64,
    /// Of those, tasks with a value.
    pub tasks_filled: u64,
    /// Unfinished tasks in projects carrying the field.
    pub tasks_active_total: u64,
    /// Of those, tasks with a value.
    pub tasks_active_filled: u64,
}

impl FieldUsageCounts {
    /// Counts one task.
    pub fn tally(&mut self, filled: bool, active: bool) {
        self.tasks_total += 1;
        self.tasks_filled += u64::from(filled);
        if active {
            self.tasks_active_total += 1;
            self.tasks_active_filled += u64::from(filled);
        }
    }
}

/// Company field with its projects and usage counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyFieldUsage {
    /// The field.
    pub field: CompanyField,
    /// Projects the field is projected onto.
    pub projects: Vec<ProjectId>,
    /// Aggregated counters.
    pub counts: FieldUsageCounts,
}
