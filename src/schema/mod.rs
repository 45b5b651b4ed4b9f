//! Dynamic field schemas for companies and projects.
//!
//! A company defines fields once and each receives a short hash minted from
//! the company counter. Projects project a subset of those fields, optionally
//! requiring them on particular statuses. Tasks validate their values against
//! the projection through [`domain::FieldValueFilter`] and
//! [`domain::RequiredFieldsCheck`].
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
