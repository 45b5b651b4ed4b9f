//! Unit tests for the workflow module.

mod graph_tests;
