//! Task aggregate tests: construction, patches, fields, ancestry and the
//! dirty set.

use crate::schema::domain::{
    CompanyField, FieldDataType, FieldHash, FieldStyle, FilteredFields, NewCompanyField,
    ProjectFieldView,
};
use crate::shared::{Actor, CompanyId, FederationId, StopId, TaskId, UserId, Validator};
use crate::task::domain::{
    BuiltinStatus, CompanyPriority, DirtyKey, NewTask, Priority, Project, StatusChange, Task,
    TaskColumnWrite, TaskDomainError, Team, TeamChange,
};
use chrono::Utc;
use eyre::ensure;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

struct Tenant {
    federation: FederationId,
    company: CompanyId,
    project: Project,
    creator: Actor,
}

impl Tenant {
    fn draft(&self, name: &str) -> NewTask {
        NewTask::new(
            name,
            self.federation,
            self.company,
            self.project.id,
            self.creator.clone(),
        )
    }

    fn task(&self, name: &str) -> Task {
        Task::new(self.draft(name), &Validator::default(), &DefaultClock)
            .expect("draft should be valid")
    }
}

#[fixture]
fn tenant() -> Tenant {
    let federation = FederationId::new();
    let company = CompanyId::new();
    Tenant {
        federation,
        company,
        project: Project::new(federation, company, "Roadmap"),
        creator: Actor::new(UserId::new(), "owner@example.com"),
    }
}

fn view(counter: u64, data_type: FieldDataType) -> ProjectFieldView {
    let draft = NewCompanyField::new(CompanyId::new(), "Field", data_type, "owner@example.com");
    ProjectFieldView {
        field: CompanyField::from_draft(
            draft,
            FieldHash::mint(counter).expect("counter should mint"),
            Utc::now(),
        ),
        required_on_statuses: BTreeSet::new(),
        style: FieldStyle::Default,
    }
}

#[rstest]
fn new_task_starts_unknown_with_itself_as_path(tenant: Tenant) {
    let parent = TaskId::new();
    let task = Task::new(
        tenant.draft("Write release notes").with_path(vec![parent, parent]),
        &Validator::default(),
        &DefaultClock,
    )
    .expect("draft should be valid");

    assert_eq!(task.status(), BuiltinStatus::Unknown.code());
    assert_eq!(task.path(), [parent, task.id()]);
    assert_eq!(task.parent(), Some(parent));
    assert!(task.fields().is_empty());
    assert!(task.dirty().is_empty());
    assert!(task.finished_at().is_none());
    assert_eq!(task.created_at(), task.updated_at());
}

#[rstest]
fn new_task_reports_every_invalid_attribute(tenant: Tenant) {
    let mut draft = tenant.draft("ab").with_description("d".repeat(5001));
    draft.creator = Actor::new(UserId::new(), "not-an-email");

    let Err(TaskDomainError::Validation(errors)) =
        Task::new(draft, &Validator::default(), &DefaultClock)
    else {
        panic!("invalid draft should be rejected");
    };

    assert!(errors.has_field("name"));
    assert!(errors.has_field("created_by"));
    assert!(errors.has_field("description"));
}

#[rstest]
fn icons_are_free_form(tenant: Tenant) {
    let icon = "i".repeat(64);
    let mut task = Task::new(
        tenant.draft("Decorated").with_icon(icon.clone()),
        &Validator::default(),
        &DefaultClock,
    )
    .expect("any icon should be accepted");
    assert_eq!(task.icon(), icon);

    task.patch_icon("", &DefaultClock);
    assert_eq!(task.dirty().get(&DirtyKey::Icon), Some(&json!(icon)));
}

#[rstest]
#[case(2, false)]
#[case(3, true)]
#[case(100, true)]
#[case(101, false)]
fn task_name_length_is_bounded(tenant: Tenant, #[case] chars: usize, #[case] valid: bool) {
    let result = Task::new(
        tenant.draft(&"n".repeat(chars)),
        &Validator::default(),
        &DefaultClock,
    );
    assert_eq!(result.is_ok(), valid);
}

#[rstest]
fn participants_exclude_watchers_and_blanks(tenant: Tenant) {
    let team = Team {
        responsible: "lead@example.com".to_owned(),
        implementer: "owner@example.com".to_owned(),
        manager: String::new(),
        co_workers: vec!["dev@example.com".to_owned(), String::new(), "dev@example.com".to_owned()],
        watchers: vec!["boss@example.com".to_owned()],
    };
    let task = Task::new(
        tenant.draft("Plan sprint").with_team(team),
        &Validator::default(),
        &DefaultClock,
    )
    .expect("draft should be valid");

    assert_eq!(
        task.participants(),
        ["owner@example.com", "lead@example.com", "dev@example.com"]
    );
    assert_eq!(task.team().co_workers, ["dev@example.com"]);
}

#[rstest]
fn patches_keep_the_first_previous_value(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Initial name");
    let validator = Validator::default();

    task.patch_name("Second name", &validator, &DefaultClock)?;
    task.patch_name("Third name", &validator, &DefaultClock)?;

    ensure!(task.name() == "Third name", "name should be replaced");
    ensure!(
        task.dirty().get(&DirtyKey::Name) == Some(&json!("Initial name")),
        "dirty set should keep the pre-image"
    );
    ensure!(task.dirty().len() == 1, "one key should be dirty");
    Ok(())
}

#[rstest]
fn unchanged_values_leave_the_task_clean(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Stable name");
    task.patch_name("Stable name", &Validator::default(), &DefaultClock)?;
    task.patch_priority(Priority::default(), &DefaultClock);
    task.patch_tags(&[], &DefaultClock);
    ensure!(task.dirty().is_empty(), "no change should be tracked");
    Ok(())
}

#[rstest]
fn take_dirty_drains_in_journal_order(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Ordered task");
    task.patch_team(TeamChange::default().watchers(["w@example.com"]), &DefaultClock);
    task.patch_tags(&["alpha".to_owned()], &DefaultClock);
    task.patch_name("Renamed task", &Validator::default(), &DefaultClock)?;

    let keys: Vec<DirtyKey> = task.take_dirty().into_iter().map(|(key, _)| key).collect();

    ensure!(
        keys == [DirtyKey::Name, DirtyKey::Tags, DirtyKey::WatchBy],
        "unexpected order {keys:?}"
    );
    ensure!(task.dirty().is_empty(), "draining should clear the set");
    Ok(())
}

#[rstest]
fn team_patch_recomputes_participants(tenant: Tenant) {
    let mut task = tenant.task("Staffed task");
    task.patch_team(
        TeamChange::default()
            .implementer("dev@example.com")
            .co_workers(["pair@example.com"]),
        &DefaultClock,
    );

    assert_eq!(
        task.participants(),
        ["owner@example.com", "dev@example.com", "pair@example.com"]
    );
    assert_eq!(task.dirty().get(&DirtyKey::ImplementBy), Some(&json!("")));
    assert_eq!(task.dirty().get(&DirtyKey::CoWorkersBy), Some(&json!([])));
}

#[rstest]
fn fields_must_be_projected(tenant: Tenant) {
    let mut task = tenant.task("Field task");
    let projection = vec![view(0, FieldDataType::String)];

    let result = task.set_field("zz", json!("x"), &projection, &DefaultClock);

    assert_eq!(result, Err(TaskDomainError::FieldNotProjected("zz".to_owned())));
    assert!(task.fields().is_empty());
}

#[rstest]
#[case(FieldDataType::String, json!("text"), DirtyKey::Field("a".to_owned()))]
#[case(FieldDataType::Array, json!(["x"]), DirtyKey::FieldArray("a".to_owned()))]
#[case(FieldDataType::People, json!(["p@example.com"]), DirtyKey::FieldArray("a".to_owned()))]
fn set_valued_fields_use_array_keys(
    tenant: Tenant,
    #[case] data_type: FieldDataType,
    #[case] value: Value,
    #[case] key: DirtyKey,
) {
    let mut task = tenant.task("Field task");
    let projection = vec![view(0, data_type)];

    task.set_field("a", value.clone(), &projection, &DefaultClock)
        .expect("projected field should be accepted");

    assert_eq!(task.fields().get("a"), Some(&value));
    assert_eq!(task.raw_fields().get("a"), Some(&value));
    assert_eq!(task.dirty().get(&key), Some(&Value::Null));
}

#[rstest]
fn apply_fields_sets_and_removes(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Field task");
    let projection = vec![view(0, FieldDataType::Integer), view(1, FieldDataType::Text)];
    task.set_field("b", json!("notes"), &projection, &DefaultClock)?;
    task.take_dirty();

    let filtered = FilteredFields {
        set: BTreeMap::from([("a".to_owned(), json!(7))]),
        removed: BTreeSet::from(["b".to_owned()]),
    };
    task.apply_fields(filtered, &projection, &DefaultClock)?;

    ensure!(task.fields().get("a") == Some(&json!(7)), "a should be set");
    ensure!(!task.fields().contains_key("b"), "b should be removed");
    ensure!(
        task.dirty().get(&DirtyKey::Field("b".to_owned())) == Some(&json!("notes")),
        "removal should keep the old value"
    );
    Ok(())
}

#[rstest]
fn reparenting_rewrites_the_path(tenant: Tenant) -> eyre::Result<()> {
    let grandparent = tenant.task("Grandparent");
    let parent = Task::new(
        tenant.draft("Parent task").with_path(grandparent.path().to_vec()),
        &Validator::default(),
        &DefaultClock,
    )?;
    let mut child = tenant.task("Child task");

    child.patch_parent(Some(&parent), &DefaultClock)?;
    ensure!(
        child.path() == [grandparent.id(), parent.id(), child.id()],
        "path should end with the child"
    );
    ensure!(child.parent() == Some(parent.id()), "parent should be set");

    child.patch_parent(None, &DefaultClock)?;
    ensure!(child.path() == [child.id()], "root path is the task alone");
    Ok(())
}

#[rstest]
fn reparenting_refuses_self_and_cycles(tenant: Tenant) -> eyre::Result<()> {
    let mut root = tenant.task("Root task");
    let descendant = Task::new(
        tenant.draft("Descendant").with_path(root.path().to_vec()),
        &Validator::default(),
        &DefaultClock,
    )?;

    let self_parent = root.clone();
    ensure!(
        root.patch_parent(Some(&self_parent), &DefaultClock)
            == Err(TaskDomainError::SelfParent(root.id())),
        "self-parenting should fail"
    );
    ensure!(
        root.patch_parent(Some(&descendant), &DefaultClock)
            == Err(TaskDomainError::ParentCycle {
                task: root.id(),
                parent: descendant.id(),
            }),
        "cycles should fail"
    );
    ensure!(root.dirty().is_empty(), "failed patches leave no trace");
    Ok(())
}

#[rstest]
fn descendants_follow_a_moved_ancestor(tenant: Tenant) -> eyre::Result<()> {
    let root = tenant.task("Root task");
    let mut middle = Task::new(
        tenant.draft("Middle task").with_path(root.path().to_vec()),
        &Validator::default(),
        &DefaultClock,
    )?;
    let mut leaf = Task::new(
        tenant.draft("Leaf task").with_path(middle.path().to_vec()),
        &Validator::default(),
        &DefaultClock,
    )?;
    let stranger = tenant.task("Stranger");

    middle.patch_parent(None, &DefaultClock)?;
    ensure!(
        leaf.rebase_path(middle.id(), middle.path(), &DefaultClock),
        "leaf sits below the moved task"
    );
    ensure!(leaf.path() == [middle.id(), leaf.id()], "old root should be gone");
    ensure!(
        leaf.dirty().get(&DirtyKey::Path)
            == Some(&json!([
                root.id().to_string(),
                middle.id().to_string(),
                leaf.id().to_string()
            ])),
        "pre-image should be the old path"
    );

    middle.patch_parent(Some(&stranger), &DefaultClock)?;
    leaf.rebase_path(middle.id(), middle.path(), &DefaultClock);
    ensure!(
        leaf.path() == [stranger.id(), middle.id(), leaf.id()],
        "new ancestry should precede the moved task"
    );
    ensure!(
        !leaf.rebase_path(root.id(), root.path(), &DefaultClock),
        "unrelated tasks leave the path alone"
    );
    Ok(())
}

#[rstest]
fn unprojected_values_are_dropped(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Field task");
    let source = vec![view(0, FieldDataType::String), view(1, FieldDataType::Array)];
    let target = vec![view(1, FieldDataType::Array)];
    task.set_field("a", json!("kept?"), &source, &DefaultClock)?;
    task.set_field("b", json!(["x"]), &source, &DefaultClock)?;
    task.take_dirty();

    let dropped = task.retain_projected(&source, &target, &DefaultClock);

    ensure!(dropped == ["a"], "only a leaves the projection");
    ensure!(!task.fields().contains_key("a"), "typed value removed");
    ensure!(!task.raw_fields().contains_key("a"), "raw value removed");
    ensure!(task.fields().get("b") == Some(&json!(["x"])), "b stays");
    ensure!(
        task.dirty().get(&DirtyKey::Field("a".to_owned())) == Some(&json!("kept?")),
        "removal should keep the old value"
    );
    ensure!(
        task.retain_projected(&source, &target, &DefaultClock).is_empty(),
        "second pass has nothing to drop"
    );
    Ok(())
}

#[rstest]
fn moving_requires_a_sibling_project(tenant: Tenant) {
    let mut task = tenant.task("Travelling task");
    let sibling = Project::new(tenant.federation, tenant.company, "Sibling");
    let foreign_company = Project::new(tenant.federation, CompanyId::new(), "Elsewhere");
    let foreign_federation = Project::new(FederationId::new(), tenant.company, "Far away");

    assert_eq!(
        task.move_to_project(&foreign_federation, &DefaultClock),
        Err(TaskDomainError::ForeignFederation)
    );
    assert_eq!(
        task.move_to_project(&foreign_company, &DefaultClock),
        Err(TaskDomainError::ForeignCompany)
    );
    assert_eq!(
        task.move_to_project(&tenant.project, &DefaultClock),
        Err(TaskDomainError::AlreadyInProject(tenant.project.id))
    );
    assert_eq!(task.move_to_project(&sibling, &DefaultClock), Ok(()));
    assert_eq!(task.project(), sibling.id);
    assert_eq!(
        task.dirty().get(&DirtyKey::Project),
        Some(&json!(tenant.project.id.to_string()))
    );
}

#[rstest]
fn soft_delete_and_restore_round_trip(tenant: Tenant) {
    let mut task = tenant.task("Disposable");
    task.soft_delete(&DefaultClock);
    let stamp = task.deleted_at();
    task.soft_delete(&DefaultClock);

    assert!(!task.is_live());
    assert_eq!(task.deleted_at(), stamp);
    assert_eq!(task.dirty().get(&DirtyKey::DeletedAt), Some(&Value::Null));

    task.take_dirty();
    task.restore(&DefaultClock);
    assert!(task.is_live());
    assert!(task.dirty().get(&DirtyKey::DeletedAt).is_some_and(Value::is_string));
}

#[rstest]
fn stops_can_be_removed_one_at_a_time(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Tracked task");
    task.patch_status(
        StatusChange::new(1, tenant.creator.clone()),
        &tenant.project,
        crate::shared::Language::En,
        &DefaultClock,
    )?;
    let stop = task.stops().first().map(|entry| entry.id).ok_or_else(|| eyre::eyre!("stop"))?;

    let write = task.delete_stop(stop)?;
    ensure!(write == TaskColumnWrite::Stops(Vec::new()), "history should be empty");
    let missing = StopId::new();
    ensure!(
        task.delete_stop(missing) == Err(TaskDomainError::StopNotFound(missing)),
        "unknown stops should fail"
    );
    Ok(())
}

#[rstest]
fn first_open_is_recorded_once(tenant: Tenant) {
    let mut task = tenant.task("Opened task");
    let viewer = UserId::new();

    let first = task.mark_opened(viewer, &DefaultClock);
    let second = task.mark_opened(viewer, &DefaultClock);

    assert!(matches!(first, Some(TaskColumnWrite::FirstOpen(ref opens)) if opens.contains_key(&viewer)));
    assert!(second.is_none());
}

#[rstest]
#[case(3, "", "#000000")]
#[case(10, "Urgent", "#ff0000")]
#[case(11, "", "#000000")]
fn priorities_resolve_against_the_catalog(
    #[case] value: i32,
    #[case] name: &str,
    #[case] color: &str,
) {
    let catalog = vec![CompanyPriority {
        number: 10,
        name: "Urgent".to_owned(),
        color: "#ff0000".to_owned(),
    }];

    let view = Priority::new(value).resolve(&catalog);

    assert_eq!(view.number, value);
    assert_eq!(view.name, name);
    assert_eq!(view.color, color);
}

#[rstest]
fn persisted_snapshot_round_trips_through_json(tenant: Tenant) -> eyre::Result<()> {
    let mut task = tenant.task("Snapshot task");
    task.assign_number(42);
    task.mark_opened(UserId::new(), &DefaultClock);

    let encoded = serde_json::to_value(task.to_persisted())?;
    let decoded = Task::from_persisted(serde_json::from_value(encoded)?);

    ensure!(decoded == task, "snapshot should restore the task");
    Ok(())
}
