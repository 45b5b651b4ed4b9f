//! In-memory integration tests across the task, schema, activity, and
//! attachment contexts.
//!
//! Tests are organized into modules by functionality:
//! - `task_flow_tests`: Creation, custom fields, status walks, journal
//! - `attachment_flow_tests`: Uploads, listings, removal journalled on tasks

mod in_memory {
    pub mod helpers;

    mod attachment_flow_tests;
    mod task_flow_tests;
}
