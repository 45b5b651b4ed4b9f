//! Adapter implementations for field schema ports.

pub mod memory;
pub mod postgres;
