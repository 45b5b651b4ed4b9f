//! Then steps for task status BDD scenarios.

use super::world::{TaskStatusWorld, run_async};
use atrium::activity::{domain::ActivityKind, ports::ActivityPage};
use atrium::task::{domain::TaskDomainError, services::TaskServiceError};
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn last_error(world: &TaskStatusWorld) -> Result<&TaskServiceError, eyre::Report> {
    match world.last_change.as_ref() {
        Some(Err(err)) => Ok(err),
        Some(Ok(outcome)) => Err(eyre::eyre!("expected a refusal, got {outcome:?}")),
        None => Err(eyre::eyre!("no status change attempted")),
    }
}

#[then("the task status is {status:i32}")]
fn task_status_is(world: &TaskStatusWorld, status: i32) -> Result<(), eyre::Report> {
    let actual = world.task()?.status();
    if actual != status {
        return Err(eyre::eyre!("expected status {status}, found {actual}"));
    }
    Ok(())
}

#[then("the status change is denied")]
fn change_denied(world: &TaskStatusWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    if !matches!(
        err,
        TaskServiceError::Domain(TaskDomainError::StatusTransitionDenied { .. })
    ) {
        return Err(eyre::eyre!("expected StatusTransitionDenied, got {err:?}"));
    }
    Ok(())
}

#[then("the status change needs a reason")]
fn change_needs_reason(world: &TaskStatusWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    if !matches!(
        err,
        TaskServiceError::Domain(TaskDomainError::CancelReasonRequired)
    ) {
        return Err(eyre::eyre!("expected CancelReasonRequired, got {err:?}"));
    }
    Ok(())
}

#[then("the journal holds {count:usize} status changes")]
fn journal_holds(world: &TaskStatusWorld, count: usize) -> Result<(), eyre::Report> {
    let id = world.task()?.id();
    let slice = run_async(world.service.list_activities(id, ActivityPage::default()))
        .wrap_err("list activities")?;
    let recorded = slice
        .activities
        .iter()
        .filter(|activity| activity.kind == ActivityKind::TaskStatus)
        .count();
    if recorded != count {
        return Err(eyre::eyre!("expected {count} status changes, found {recorded}"));
    }
    Ok(())
}
