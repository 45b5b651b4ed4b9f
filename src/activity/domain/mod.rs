//! Domain model for the activity journal.

mod activity;
mod error;
mod journal;
mod meta;

pub use activity::{Activity, ActivityKind, TASK_ENTITY};
pub use error::ActivityDomainError;
pub use journal::{TaskJournal, file_deleted};
pub use meta::{
    FieldArrayMeta, FieldChangeMeta, FileDeletedMeta, StatusChangeMeta, TaskDeletedMeta,
    TeamChangeMeta, difference,
};
