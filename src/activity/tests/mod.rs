//! Unit tests for the activity journal.
