//! Domain model for the task aggregate.
//!
//! A task records the previous value of every attribute it changes in a
//! [`DirtySet`]; the activity journal turns that set into records when the
//! task is flushed.

mod ancestry;
mod dirty;
mod error;
mod priority;
mod project;
mod status;
mod stop;
mod task;
mod team;

pub use ancestry::{dedup, patch_ancestry};
pub use dirty::{DirtyKey, DirtySet};
pub use error::TaskDomainError;
pub use priority::{
    BUILTIN_PRIORITY_COLOR, CompanyPriority, PRIORITY_CATALOG_THRESHOLD, Priority, PriorityView,
};
pub use project::{DEFAULT_PROJECT_COLOR, Project, ProjectOptions, ProjectStatus};
pub use status::{BuiltinStatus, MAX_STATUS, StatusChange, StatusTransition};
pub use stop::Stop;
pub use task::{NewTask, PersistedTask, Task, TaskColumnWrite};
pub use team::{Team, TeamChange, dedup_non_empty, participants};
