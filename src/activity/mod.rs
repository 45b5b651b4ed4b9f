//! Append-only journal of task changes.
//!
//! Activities are produced from a task's dirty set inside the same unit of
//! work that persists the task. The module follows hexagonal architecture:
//!
//! - Domain types and the dirty-set journal in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
