//! Atrium: task lifecycle core of a multi-tenant CRM.
//!
//! Tasks move through per-project status workflows, carry company-defined
//! custom fields, keep an activity journal of every change, and hold file
//! attachments with resized photo renditions.
//!
//! # Architecture
//!
//! Atrium follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, object store,
//!   in-memory)
//!
//! # Modules
//!
//! - [`workflow`]: Status graphs and reachability
//! - [`schema`]: Company field definitions, project projections, and value
//!   coercion
//! - [`task`]: The task aggregate and its lifecycle service
//! - [`activity`]: Journal entries derived from task changes
//! - [`attachment`]: File storage, photo renditions, and presigned links
//! - [`shared`]: Identifiers, actors, validation, and the change feed
//! - [`config`]: Layered application configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod activity;
pub mod attachment;
pub mod config;
pub mod schema;
pub mod shared;
pub mod task;
pub mod telemetry;
pub mod workflow;
