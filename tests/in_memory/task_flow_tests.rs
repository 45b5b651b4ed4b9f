//! End-to-end task lifecycle over in-memory adapters.

use std::collections::BTreeMap;

use super::helpers::{Workspace, workspace};
use atrium::activity::{domain::ActivityKind, ports::ActivityPage};
use atrium::shared::{ChangedEntity, Classify, ErrorKind, TaskId};
use atrium::task::{domain::StatusChange, services::TaskServiceError};
use rstest::rstest;
use serde_json::{Value, json};

fn values(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

async fn advance(
    workspace: &Workspace,
    id: TaskId,
    statuses: &[i32],
) -> Result<(), eyre::Report> {
    for status in statuses {
        workspace
            .service
            .change_status(id, StatusChange::new(*status, workspace.actor.clone()))
            .await?;
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_reaches_done_once_required_fields_are_filled(
    workspace: Result<Workspace, eyre::Report>,
) -> Result<(), eyre::Report> {
    let workspace = workspace?;
    let mut events = workspace.feed.subscribe();
    let task = workspace
        .service
        .create_task(workspace.draft("Replace compressor"))
        .await?;
    let created = events.recv().await?;
    eyre::ensure!(created.entity == ChangedEntity::Task, "creation should be published");

    advance(&workspace, task.id(), &[1, 2, 4]).await?;
    let refused = workspace
        .service
        .change_status(task.id(), StatusChange::new(5, workspace.actor.clone()))
        .await;
    let Err(err @ TaskServiceError::MissingRequired(_)) = refused else {
        return Err(eyre::eyre!("done should wait for the root cause, got {refused:?}"));
    };
    eyre::ensure!(err.kind() == ErrorKind::Precondition, "unexpected kind {:?}", err.kind());

    workspace
        .service
        .set_fields(
            task.id(),
            &values(&[("a", json!("worn bearing")), ("b", json!(3))]),
            &workspace.actor,
        )
        .await?;
    advance(&workspace, task.id(), &[5]).await?;

    let done = workspace.service.get_task(task.id()).await?;
    eyre::ensure!(done.status() == 5, "task should be done");
    eyre::ensure!(done.finished_at().is_some(), "finish time should be stamped");
    eyre::ensure!(
        done.fields().get("a") == Some(&json!("worn bearing")),
        "field a should be stored"
    );

    let journal = workspace
        .service
        .list_activities(task.id(), ActivityPage::default())
        .await?;
    let statuses = journal
        .activities
        .iter()
        .filter(|activity| activity.kind == ActivityKind::TaskStatus)
        .count();
    eyre::ensure!(statuses == 4, "expected 4 status entries, found {statuses}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopened_tasks_lose_their_finish_time(
    workspace: Result<Workspace, eyre::Report>,
) -> Result<(), eyre::Report> {
    let workspace = workspace?;
    let task = workspace
        .service
        .create_task(workspace.draft("Inspect boiler").with_raw_fields(values(&[("a", json!("scale"))])))
        .await?;
    advance(&workspace, task.id(), &[1, 2, 4, 5]).await?;
    let finished = workspace.service.get_task(task.id()).await?;
    eyre::ensure!(finished.finished_at().is_some(), "done should stamp the finish time");

    advance(&workspace, task.id(), &[2]).await?;

    let reopened = workspace.service.get_task(task.id()).await?;
    eyre::ensure!(reopened.status() == 2, "task should be back in work");
    eyre::ensure!(reopened.finished_at().is_none(), "finish time should be cleared");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_fields_are_rejected(
    workspace: Result<Workspace, eyre::Report>,
) -> Result<(), eyre::Report> {
    let workspace = workspace?;
    let task = workspace
        .service
        .create_task(workspace.draft("Calibrate sensor"))
        .await?;

    let result = workspace
        .service
        .set_fields(task.id(), &values(&[("zz", json!(1))]), &workspace.actor)
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("unknown key should fail"))?;
    eyre::ensure!(err.kind() == ErrorKind::Validation, "unexpected kind {:?}", err.kind());
    let stored = workspace.service.get_task(task.id()).await?;
    eyre::ensure!(stored.fields().is_empty(), "nothing should be stored");
    Ok(())
}
