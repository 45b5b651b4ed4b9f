//! In-memory adapters for the activity journal.

mod activity;

pub use activity::InMemoryActivityRepository;
