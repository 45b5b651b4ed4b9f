//! Pre-images of task attributes changed since the last flush.
//!
//! The journal consumes the set in [`DirtyKey`] order, so replaying a flush
//! always yields activities in the same sequence.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute whose previous value is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirtyKey {
    /// Task name.
    Name,
    /// Status code.
    Status,
    /// Description.
    Description,
    /// Priority.
    Priority,
    /// Due date.
    FinishTo,
    /// Icon.
    Icon,
    /// Tag list.
    Tags,
    /// Owning project.
    Project,
    /// Ancestry path.
    Path,
    /// Scalar dynamic field, by hash.
    Field(String),
    /// Set-valued dynamic field, by hash.
    FieldArray(String),
    /// Responsible person.
    ResponsibleBy,
    /// Implementer.
    ImplementBy,
    /// Manager.
    ManagedBy,
    /// Co-worker list.
    CoWorkersBy,
    /// Watcher list.
    WatchBy,
    /// Soft-delete stamp.
    DeletedAt,
}

impl DirtyKey {
    const fn rank(&self) -> u8 {
        match self {
            Self::Name => 0,
            Self::Status => 1,
            Self::Description => 2,
            Self::Priority => 3,
            Self::FinishTo => 4,
            Self::Icon => 5,
            Self::Tags => 6,
            Self::Project => 7,
            Self::Path => 8,
            Self::Field(_) => 9,
            Self::FieldArray(_) => 10,
            Self::ResponsibleBy => 11,
            Self::ImplementBy => 12,
            Self::ManagedBy => 13,
            Self::CoWorkersBy => 14,
            Self::WatchBy => 15,
            Self::DeletedAt => 16,
        }
    }

    /// Returns the lowercased attribute name, `field:<hash>` or
    /// `fieldarray:<hash>` for dynamic fields.
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::Field(hash) => format!("field:{hash}"),
            Self::FieldArray(hash) => format!("fieldarray:{hash}"),
            other => other.static_name().to_owned(),
        }
    }

    const fn static_name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::Description => "description",
            Self::Priority => "priority",
            Self::FinishTo => "finish_to",
            Self::Icon => "icon",
            Self::Tags => "tags",
            Self::Project => "project",
            Self::Path => "path",
            Self::Field(_) => "field",
            Self::FieldArray(_) => "fieldarray",
            Self::ResponsibleBy => "responsible_by",
            Self::ImplementBy => "implement_by",
            Self::ManagedBy => "managed_by",
            Self::CoWorkersBy => "co_workers_by",
            Self::WatchBy => "watch_by",
            Self::DeletedAt => "deleted_at",
        }
    }

    /// Returns `true` for role keys reported as team changes.
    #[must_use]
    pub const fn is_team(&self) -> bool {
        matches!(
            self,
            Self::ResponsibleBy
                | Self::ImplementBy
                | Self::ManagedBy
                | Self::CoWorkersBy
                | Self::WatchBy
        )
    }

    fn hash_part(&self) -> Option<&str> {
        match self {
            Self::Field(hash) | Self::FieldArray(hash) => Some(hash),
            _ => None,
        }
    }
}

impl Ord for DirtyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| {
            let left = self.hash_part().unwrap_or_default();
            let right = other.hash_part().unwrap_or_default();
            (left.len(), left).cmp(&(right.len(), right))
        })
    }
}

impl PartialOrd for DirtyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DirtyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Ordered map from attribute to the value it held before the first change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirtySet {
    entries: BTreeMap<DirtyKey, Value>,
}

impl DirtySet {
    /// Records the pre-image of `key`; later changes keep the first one.
    pub fn record(&mut self, key: DirtyKey, previous: Value) {
        self.entries.entry(key).or_insert(previous);
    }

    /// Returns the recorded pre-image of `key`.
    #[must_use]
    pub fn get(&self, key: &DirtyKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns `true` when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of changed attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates entries in journal order.
    pub fn iter(&self) -> impl Iterator<Item = (&DirtyKey, &Value)> {
        self.entries.iter()
    }

    /// Removes and returns every entry in journal order.
    pub fn drain(&mut self) -> Vec<(DirtyKey, Value)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}
