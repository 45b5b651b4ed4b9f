//! Application services for task lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    MoveTaskRequest, StatusChangeOutcome, TaskDetails, TaskLifecycleService, TaskServiceError,
    TaskServiceResult,
};
