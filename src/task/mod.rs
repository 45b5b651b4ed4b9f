//! Task aggregate and its lifecycle.
//!
//! A task belongs to a project, carries dynamic field values keyed by field
//! hash, sits in an ancestry path and moves between statuses along the
//! project's workflow. Every change is tracked so the activity journal can
//! describe it. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
