//! Given steps for task status BDD scenarios.

use super::world::{TaskStatusWorld, run_async};
use atrium::schema::ports::FieldSchemaRepository;
use atrium::shared::{CompanyId, FederationId};
use atrium::task::{
    domain::{NewTask, Project, ProjectOptions},
    ports::ProjectRepository,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn store_project(world: &mut TaskStatusWorld, options: ProjectOptions) -> Result<(), eyre::Report> {
    let company = CompanyId::new();
    let project = Project::new(FederationId::new(), company, "Operations").with_options(options);
    run_async(world.schema.register_company(company)).wrap_err("register company")?;
    run_async(world.repository.store_project(&project)).wrap_err("store project")?;
    world.project = Some(project);
    Ok(())
}

#[given("a project using the default workflow")]
fn default_project(world: &mut TaskStatusWorld) -> Result<(), eyre::Report> {
    store_project(world, ProjectOptions::default())
}

#[given("a project that requires a cancellation comment")]
fn strict_project(world: &mut TaskStatusWorld) -> Result<(), eyre::Report> {
    store_project(
        world,
        ProjectOptions {
            require_cancelation_comment: true,
            ..ProjectOptions::default()
        },
    )
}

#[given(r#"a task named "{name}""#)]
fn task_named(world: &mut TaskStatusWorld, name: String) -> Result<(), eyre::Report> {
    let project = world
        .project
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing project in scenario world"))?;
    let draft = NewTask::new(
        name,
        project.federation,
        project.company,
        project.id,
        world.actor.clone(),
    );
    let created = run_async(world.service.create_task(draft)).wrap_err("create task")?;
    world.task = Some(created);
    Ok(())
}
