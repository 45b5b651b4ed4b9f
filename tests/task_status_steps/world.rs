//! Shared world state for task status BDD scenarios.

use std::sync::Arc;

use atrium::activity::adapters::memory::InMemoryActivityRepository;
use atrium::schema::adapters::memory::InMemoryFieldSchemaRepository;
use atrium::shared::{Actor, BroadcastChangeFeed, UserId, Validator};
use atrium::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Project, Task},
    services::{StatusChangeOutcome, TaskLifecycleService, TaskServiceResult},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryActivityRepository,
    InMemoryFieldSchemaRepository,
    BroadcastChangeFeed,
    DefaultClock,
>;

/// Scenario world for task status behaviour tests.
pub struct TaskStatusWorld {
    pub service: TestTaskService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub schema: Arc<InMemoryFieldSchemaRepository>,
    pub actor: Actor,
    pub project: Option<Project>,
    pub task: Option<Task>,
    pub last_change: Option<TaskServiceResult<StatusChangeOutcome>>,
}

impl TaskStatusWorld {
    /// Creates a world with empty repositories.
    #[must_use]
    pub fn new() -> Self {
        let journal = InMemoryActivityRepository::new();
        let repository = Arc::new(InMemoryTaskRepository::with_journal(journal.clone()));
        let schema = Arc::new(InMemoryFieldSchemaRepository::new());
        let service = TaskLifecycleService::new(
            Arc::clone(&repository),
            Arc::new(journal),
            Arc::clone(&schema),
            Arc::new(BroadcastChangeFeed::default()),
            Arc::new(DefaultClock),
            Validator::default(),
        );

        Self {
            service,
            repository,
            schema,
            actor: Actor::new(UserId::new(), "planner@example.com"),
            project: None,
            task: None,
            last_change: None,
        }
    }

    /// Returns the task created by a given step.
    ///
    /// # Errors
    ///
    /// Fails when no task was created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for TaskStatusWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskStatusWorld {
    TaskStatusWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
