//! Status transition rules of the task aggregate.

use crate::shared::{Actor, CompanyId, FederationId, Language, UserId, Validator};
use crate::task::domain::{
    BuiltinStatus, DirtyKey, NewTask, Project, ProjectOptions, ProjectStatus, StatusChange, Task,
    TaskDomainError,
};
use crate::workflow::domain::StatusGraph;
use eyre::ensure;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn actor() -> Actor {
    Actor::new(UserId::new(), "worker@example.com")
}

fn project(options: ProjectOptions, graph: Option<&str>) -> Project {
    let base = Project::new(FederationId::new(), CompanyId::new(), "Workflow").with_options(options);
    match graph {
        Some(json) => base.with_status_graph(StatusGraph::from_json(json).expect("graph parses")),
        None => base,
    }
}

fn task_in(project: &Project, actor: &Actor) -> Task {
    let draft = NewTask::new(
        "Status task",
        project.federation,
        project.company,
        project.id,
        actor.clone(),
    );
    Task::new(draft, &Validator::default(), &DefaultClock).expect("draft should be valid")
}

fn walk(task: &mut Task, project: &Project, actor: &Actor, statuses: &[i32]) {
    for status in statuses {
        task.patch_status(
            StatusChange::new(*status, actor.clone()).with_comment("moving on"),
            project,
            Language::En,
            &DefaultClock,
        )
        .expect("walk should follow the workflow");
    }
}

#[rstest]
#[case(&[], 1)]
#[case(&[], 2)]
#[case(&[1], 5)]
#[case(&[1, 2, 6], 2)]
#[case(&[1, 2, 4, 5], 2)]
fn default_workflow_allows_reachable_targets(
    actor: Actor,
    #[case] before: &[i32],
    #[case] target: i32,
) {
    let project = project(ProjectOptions::default(), None);
    let mut task = task_in(&project, &actor);
    walk(&mut task, &project, &actor, before);

    let result = task.patch_status(
        StatusChange::new(target, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    );

    assert!(result.is_ok());
    assert_eq!(task.status(), target);
}

#[rstest]
fn same_status_is_rejected_first(actor: Actor) {
    let project = project(ProjectOptions::default(), None);
    let mut task = task_in(&project, &actor);

    let result = task.patch_status(
        StatusChange::new(0, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    );

    assert_eq!(result, Err(TaskDomainError::SameStatus(0)));
}

#[rstest]
fn unreachable_targets_report_the_search_path(actor: Actor) {
    let project = project(ProjectOptions::default(), Some(r#"{"0": ["1"], "1": [], "5": []}"#));
    let mut task = task_in(&project, &actor);

    let Err(TaskDomainError::StatusTransitionDenied { from, to, path }) = task.patch_status(
        StatusChange::new(5, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    ) else {
        panic!("status 5 should be unreachable");
    };

    assert_eq!((from, to), (0, 5));
    assert_eq!(path, ["0", "1"]);
    assert!(task.dirty().is_empty());
    assert!(task.stops().is_empty());
}

#[rstest]
fn tasks_never_return_to_unknown(actor: Actor) {
    let project = project(ProjectOptions::default(), Some(r#"{"0": ["1"], "1": ["*"]}"#));
    let mut task = task_in(&project, &actor);
    walk(&mut task, &project, &actor, &[1]);

    let result = task.patch_status(
        StatusChange::new(0, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    );

    assert_eq!(result, Err(TaskDomainError::ReturnToUnknown));
}

#[rstest]
fn statuses_above_the_range_are_rejected(actor: Actor) {
    let project = project(ProjectOptions::default(), Some(r#"{"0": ["12"]}"#));
    let mut task = task_in(&project, &actor);

    let result = task.patch_status(
        StatusChange::new(12, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    );

    assert_eq!(result, Err(TaskDomainError::StatusOutOfRange(12)));
}

#[rstest]
#[case(6, "", Some(TaskDomainError::CancelReasonRequired))]
#[case(5, "", Some(TaskDomainError::DoneReasonRequired))]
#[case(6, "obsolete", None)]
#[case(5, "shipped", None)]
#[case(3, "", None)]
fn cancelation_comment_switch_gates_cancel_and_done(
    actor: Actor,
    #[case] target: i32,
    #[case] comment: &str,
    #[case] expected: Option<TaskDomainError>,
) {
    let options = ProjectOptions {
        require_cancelation_comment: true,
        ..ProjectOptions::default()
    };
    let project = project(options, Some(r#"{"0": ["3", "5", "6"]}"#));
    let mut task = task_in(&project, &actor);

    let result = task.patch_status(
        StatusChange::new(target, actor.clone()).with_comment(comment),
        &project,
        Language::En,
        &DefaultClock,
    );

    assert_eq!(result.err(), expected);
}

#[rstest]
fn done_comment_switch_alone_does_not_gate(actor: Actor) {
    let options = ProjectOptions {
        require_done_comment: true,
        ..ProjectOptions::default()
    };
    let project = project(options, Some(r#"{"0": ["5"]}"#));
    let mut task = task_in(&project, &actor);

    let result = task.patch_status(
        StatusChange::new(5, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    );

    assert!(result.is_ok());
}

#[rstest]
fn done_stamps_completion_and_leaving_clears_it(actor: Actor) -> eyre::Result<()> {
    let project = project(ProjectOptions::default(), None);
    let mut task = task_in(&project, &actor);
    walk(&mut task, &project, &actor, &[1, 2, 4, 5]);

    ensure!(task.finished_at().is_some(), "done should stamp finished_at");
    ensure!(task.finished_by() == "worker@example.com", "done should stamp the actor");

    walk(&mut task, &project, &actor, &[2]);
    ensure!(task.finished_at().is_none(), "reopening should clear finished_at");
    ensure!(task.finished_by().is_empty(), "reopening should clear finished_by");
    Ok(())
}

#[rstest]
fn every_transition_appends_a_named_stop(actor: Actor) -> eyre::Result<()> {
    let catalog = vec![ProjectStatus {
        number: 2,
        name: "Building".to_owned(),
        color: "#00ff00".to_owned(),
        description: String::new(),
    }];
    let project = project(ProjectOptions::default(), None).with_statuses(catalog);
    let mut task = task_in(&project, &actor);

    let transition = task.patch_status(
        StatusChange::new(1, actor.clone()).with_comment("triaged"),
        &project,
        Language::Ru,
        &DefaultClock,
    )?;
    task.patch_status(
        StatusChange::new(2, actor.clone()),
        &project,
        Language::En,
        &DefaultClock,
    )?;

    let names: Vec<&str> = task.stops().iter().map(|stop| stop.status_name.as_str()).collect();
    ensure!(names == ["Новая", "Building"], "unexpected stop names {names:?}");
    ensure!(
        task.stops().first().map(|stop| stop.id) == Some(transition.stop),
        "transition should name its stop"
    );
    ensure!(
        task.stops().first().map(|stop| stop.comment.as_str()) == Some("triaged"),
        "comment should be kept"
    );
    ensure!(
        task.dirty().get(&DirtyKey::Status) == Some(&json!(BuiltinStatus::Unknown.code())),
        "dirty status keeps the first pre-image"
    );
    Ok(())
}
