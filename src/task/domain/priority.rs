//! Task priority and its display resolution.

use serde::{Deserialize, Serialize};

/// Priorities at or above this value are looked up in the company catalog;
/// lower ones use the built-in palette.
pub const PRIORITY_CATALOG_THRESHOLD: i32 = 10;

/// Color of every built-in priority.
pub const BUILTIN_PRIORITY_COLOR: &str = "#000000";

/// Integer priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    /// Wraps a raw priority.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw priority.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns `true` when the priority refers to the company catalog.
    #[must_use]
    pub const fn is_catalog(self) -> bool {
        self.0 >= PRIORITY_CATALOG_THRESHOLD
    }

    /// Returns the built-in palette entry for this priority.
    #[must_use]
    pub fn palette(self) -> PriorityView {
        PriorityView {
            number: self.0,
            name: String::new(),
            color: BUILTIN_PRIORITY_COLOR.to_owned(),
        }
    }

    /// Resolves the display entry, consulting `catalog` for catalog
    /// priorities.
    ///
    /// A catalog priority missing from `catalog` falls back to the palette.
    #[must_use]
    pub fn resolve(self, catalog: &[CompanyPriority]) -> PriorityView {
        if !self.is_catalog() {
            return self.palette();
        }
        catalog
            .iter()
            .find(|entry| entry.number == self.0)
            .map_or_else(
                || {
                    tracing::error!(priority = self.0, "priority missing from company catalog");
                    self.palette()
                },
                |entry| PriorityView {
                    number: entry.number,
                    name: entry.name.clone(),
                    color: entry.color.clone(),
                },
            )
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(PRIORITY_CATALOG_THRESHOLD)
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Priority defined by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPriority {
    /// Priority value, at least [`PRIORITY_CATALOG_THRESHOLD`].
    pub number: i32,
    /// Display name.
    pub name: String,
    /// `#RRGGBB` color.
    pub color: String,
}

/// Resolved priority shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityView {
    /// Priority value.
    pub number: i32,
    /// Display name; empty for built-in priorities.
    pub name: String,
    /// `#RRGGBB` color.
    pub color: String,
}
