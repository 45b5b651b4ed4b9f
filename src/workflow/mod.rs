//! Workflow status graphs.
//!
//! A project may describe which status changes are allowed as a directed
//! graph over status labels. Every task status change consults the graph,
//! falling back to [`domain::StatusGraph::default_workflow`] when the project
//! has none. The graph is pure data, so this context has no ports.

pub mod domain;

#[cfg(test)]
mod tests;
