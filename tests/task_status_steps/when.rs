//! When steps for task status BDD scenarios.

use super::world::{TaskStatusWorld, run_async};
use atrium::task::domain::StatusChange;
use eyre::WrapErr;
use rstest_bdd_macros::when;

fn move_task(world: &mut TaskStatusWorld, change: StatusChange) -> Result<(), eyre::Report> {
    let id = world.task()?.id();
    let result = run_async(world.service.change_status(id, change));
    let refreshed = run_async(world.service.get_task(id)).wrap_err("reload task")?;
    world.task = Some(refreshed);
    world.last_change = Some(result);
    Ok(())
}

#[when(r#"the task moves through statuses "{statuses}""#)]
fn walk_statuses(world: &mut TaskStatusWorld, statuses: String) -> Result<(), eyre::Report> {
    for label in statuses.split(',') {
        let target: i32 = label
            .trim()
            .parse()
            .wrap_err_with(|| format!("status label {label}"))?;
        let change = StatusChange::new(target, world.actor.clone());
        move_task(world, change)?;
        if let Some(Err(err)) = &world.last_change {
            return Err(eyre::eyre!("walk stopped at {target}: {err}"));
        }
    }
    Ok(())
}

#[when("the task is moved to status {status:i32}")]
fn move_to(world: &mut TaskStatusWorld, status: i32) -> Result<(), eyre::Report> {
    let change = StatusChange::new(status, world.actor.clone());
    move_task(world, change)
}

#[when(r#"the task is moved to status {status:i32} with comment "{comment}""#)]
fn move_with_comment(
    world: &mut TaskStatusWorld,
    status: i32,
    comment: String,
) -> Result<(), eyre::Report> {
    let change = StatusChange::new(status, world.actor.clone()).with_comment(comment);
    move_task(world, change)
}
