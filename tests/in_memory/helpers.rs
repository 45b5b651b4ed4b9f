//! Shared fixtures for in-memory integration tests.

use std::sync::Arc;

use atrium::activity::adapters::memory::InMemoryActivityRepository;
use atrium::schema::{
    adapters::memory::InMemoryFieldSchemaRepository,
    domain::{FieldDataType, NewCompanyField, ProjectField},
    ports::FieldSchemaRepository,
};
use atrium::shared::{Actor, BroadcastChangeFeed, CompanyId, FederationId, UserId, Validator};
use atrium::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{NewTask, Project},
    ports::ProjectRepository,
    services::TaskLifecycleService,
};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::fixture;

/// Task service wired to in-memory adapters.
pub type TestTaskService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryActivityRepository,
    InMemoryFieldSchemaRepository,
    BroadcastChangeFeed,
    DefaultClock,
>;

/// A project with one required string field and one optional number field.
pub struct Workspace {
    pub service: TestTaskService,
    pub feed: Arc<BroadcastChangeFeed>,
    pub project: Project,
    pub actor: Actor,
}

impl Workspace {
    /// Builds a task draft in the workspace project.
    #[must_use]
    pub fn draft(&self, name: &str) -> NewTask {
        NewTask::new(
            name,
            self.project.federation,
            self.project.company,
            self.project.id,
            self.actor.clone(),
        )
    }
}

async fn seed() -> Result<Workspace, eyre::Report> {
    let company = CompanyId::new();
    let project = Project::new(FederationId::new(), company, "Field service");

    let journal = InMemoryActivityRepository::new();
    let repository = Arc::new(InMemoryTaskRepository::with_journal(journal.clone()));
    repository.store_project(&project).await?;

    let schema = Arc::new(InMemoryFieldSchemaRepository::new());
    schema.register_company(company).await?;
    for (name, data_type, required) in [
        ("Root cause", FieldDataType::String, vec![5]),
        ("Visits", FieldDataType::Float, Vec::new()),
    ] {
        let draft = NewCompanyField::new(company, name, data_type, "admin@example.com");
        let field = schema.create_company_field(draft, Utc::now()).await?;
        let projection =
            ProjectField::new(project.id, company, field.id(), required, "", Utc::now())?;
        schema.upsert_project_field(&projection).await?;
    }

    let feed = Arc::new(BroadcastChangeFeed::default());
    let service = TaskLifecycleService::new(
        repository,
        Arc::new(journal),
        schema,
        Arc::clone(&feed),
        Arc::new(DefaultClock),
        Validator::default(),
    );
    Ok(Workspace {
        service,
        feed,
        project,
        actor: Actor::new(UserId::new(), "dispatcher@example.com"),
    })
}

/// Provides a seeded workspace.
///
/// # Errors
///
/// Returns an error when seeding the repositories fails.
#[fixture]
pub fn workspace() -> Result<Workspace, eyre::Report> {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(seed()))
}
