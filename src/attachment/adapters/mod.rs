//! Adapter implementations for attachment ports.

pub mod filesystem;
pub mod memory;
pub mod postgres;
