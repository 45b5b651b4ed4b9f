//! Port contracts for the task lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;

pub use repository::{
    ProjectRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
