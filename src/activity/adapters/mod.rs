//! Adapter implementations for the activity journal.

pub mod memory;
pub mod postgres;
