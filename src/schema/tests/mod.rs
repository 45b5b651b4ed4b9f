//! Unit tests for the field schema module.

mod domain_tests;
