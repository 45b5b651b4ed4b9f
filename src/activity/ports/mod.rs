//! Port contracts for the activity journal.

pub mod repository;

pub use repository::{
    ActivityPage, ActivityRepository, ActivityRepositoryError, ActivityRepositoryResult,
    ActivitySlice,
};
