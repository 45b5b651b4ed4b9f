//! Unit tests for the task lifecycle module.

mod domain_tests;
mod status_tests;
