//! Status graph domain model.

mod error;
mod graph;

pub use error::StatusGraphError;
pub use graph::{ENTRY_LABEL, MAX_STATUS_LABEL, Reachability, StatusGraph, WILDCARD};
