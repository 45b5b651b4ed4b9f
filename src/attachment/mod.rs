//! Attachment pipeline for user photos and task or comment files.
//!
//! Photos are stored in four renditions produced by bounded resize and
//! upload worker pools; task and comment files are stored once and listed
//! with presigned preview links. The module follows hexagonal architecture:
//!
//! - Stage functions, keys, and file records in [`domain`]
//! - Object store, file repository, and URL cache contracts in [`ports`]
//! - In-memory, filesystem, and `PostgreSQL` adapters in [`adapters`]
//! - The pipeline and the attachment service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
