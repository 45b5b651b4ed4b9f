//! Stage function, key, file record, and latch tests.

use std::time::Duration;

use super::{Sandbox, exists};
use crate::attachment::{
    domain::{
        AttachmentDomainError, Dimensions, File, FileOwner, ObjectKey, Rendition, StorageLocation,
        is_image_mime, is_previewable_mime, probe, rendition_path, resize, sniff_mime,
    },
    services::{AttachmentServiceError, CompletionLatch, LatchFailure},
};
use crate::shared::{Actor, Classify, CommentId, ErrorKind, FederationId, FileId, TaskId, UserId};
use camino::Utf8Path;
use chrono::Utc;
use rstest::{fixture, rstest};

#[fixture]
fn sandbox() -> Sandbox {
    Sandbox::new()
}

#[rstest]
#[case(Rendition::Original, 0, false)]
#[case(Rendition::Small, 50, true)]
#[case(Rendition::Medium, 200, true)]
#[case(Rendition::Large, 600, true)]
fn renditions_map_to_widths(
    #[case] rendition: Rendition,
    #[case] width: u32,
    #[case] resized: bool,
) {
    assert_eq!(rendition.width(), width);
    assert_eq!(Rendition::from_width(width), Some(rendition));
    assert_eq!(rendition.is_resized(), resized);
    assert!(Rendition::ALL.contains(&rendition));
}

#[rstest]
fn unknown_widths_have_no_rendition() {
    assert_eq!(Rendition::from_width(100), None);
}

#[rstest]
fn photo_keys_carry_width_infix() {
    let user = UserId::new();
    assert_eq!(
        ObjectKey::photo(user, Rendition::Original).as_str(),
        format!("photos-{user}.jpg")
    );
    assert_eq!(
        ObjectKey::photo(user, Rendition::Medium).as_str(),
        format!("photos-{user}.w200.jpg")
    );
}

#[rstest]
fn attachment_keys_are_scoped_to_task() {
    let federation = FederationId::new();
    let task = TaskId::new();

    let first = ObjectKey::attachment(federation, task, ".pdf");
    let second = ObjectKey::attachment(federation, task, ".pdf");
    let bare = ObjectKey::attachment(federation, task, "");

    let prefix = format!("{federation}/task/{task}/");
    assert!(first.as_str().starts_with(&prefix));
    assert!(first.as_str().ends_with(".pdf"));
    assert_ne!(first, second);
    let object = bare.as_str().trim_start_matches(&prefix);
    assert!(uuid::Uuid::parse_str(object).is_ok());
}

#[rstest]
#[case(b"%PDF-1.7 body".as_slice(), "application/pdf")]
#[case(b"PK\x03\x04rest".as_slice(), "application/zip")]
#[case(b"plain words".as_slice(), "text/plain; charset=utf-8")]
#[case(b"\xff\xfe\x00\x81".as_slice(), "application/octet-stream")]
fn sniffing_uses_signatures(#[case] bytes: &[u8], #[case] mime: &str) {
    assert_eq!(sniff_mime(bytes), mime);
}

#[rstest]
fn mime_classes() {
    assert!(is_image_mime("image/png"));
    assert!(!is_image_mime("image/gif"));
    assert!(is_previewable_mime("image/gif"));
    assert!(is_previewable_mime("image/webp"));
    assert!(!is_previewable_mime("application/pdf"));
}

#[rstest]
fn probing_an_image_reports_dimensions(sandbox: Sandbox) {
    let path = sandbox.image("avatar.png", 1024, 768);

    let found = probe(&path).expect("png probes");

    assert_eq!(found.mime(), "image/png");
    assert_eq!(found.ext(), ".png");
    assert!(found.size() > 0);
    assert_eq!(
        found.dimensions(),
        Some(Dimensions {
            width: 1024,
            height: 768
        })
    );
    assert!(found.is_image());
}

#[rstest]
fn probing_a_gif_is_previewable_but_not_a_photo(sandbox: Sandbox) {
    let path = sandbox.image("wave.gif", 16, 8);

    let found = probe(&path).expect("gif probes");

    assert_eq!(found.mime(), "image/gif");
    assert!(!found.is_image());
    assert_eq!(found.dimensions().map(|size| size.width), Some(16));
}

#[rstest]
fn probing_a_document_has_no_dimensions(sandbox: Sandbox) {
    let path = sandbox.file("report.pdf", b"%PDF-1.7 tiny");

    let found = probe(&path).expect("pdf probes");

    assert_eq!(found.mime(), "application/pdf");
    assert_eq!(found.size(), 13);
    assert_eq!(found.dimensions(), None);
}

#[rstest]
fn probing_a_missing_file_is_an_io_error(sandbox: Sandbox) {
    let result = probe(&sandbox.root.join("absent.png"));
    assert!(matches!(result, Err(AttachmentDomainError::Io { .. })));
}

#[rstest]
fn rendition_paths_sit_next_to_source() {
    assert_eq!(
        rendition_path(Utf8Path::new("/tmp/up/avatar.png"), 50),
        Utf8Path::new("/tmp/up/avatar.w50.jpg")
    );
}

#[rstest]
fn resizing_preserves_aspect_ratio(sandbox: Sandbox) {
    let path = sandbox.image("avatar.png", 1024, 768);

    let resized = resize(&path, 200).expect("resized");
    let found = probe(&resized).expect("rendition probes");

    assert_eq!(resized, sandbox.root.join("avatar.w200.jpg"));
    assert_eq!(found.mime(), "image/jpeg");
    assert_eq!(
        found.dimensions(),
        Some(Dimensions {
            width: 200,
            height: 150
        })
    );
}

#[rstest]
fn resizing_never_upscales(sandbox: Sandbox) {
    let path = sandbox.image("icon.png", 40, 30);

    let resized = resize(&path, 600).expect("re-encoded");
    let found = probe(&resized).expect("rendition probes");

    assert_eq!(found.dimensions().map(|size| size.width), Some(40));
}

#[rstest]
fn resizing_a_non_image_fails(sandbox: Sandbox) {
    let path = sandbox.file("notes.txt", b"not pixels");

    let result = resize(&path, 50);

    assert!(matches!(result, Err(AttachmentDomainError::Image { .. })));
    assert!(!exists(&sandbox.root.join("notes.w50.jpg")));
}

fn named(sandbox: &Sandbox, name: &str) -> Result<File, AttachmentDomainError> {
    let path = sandbox.file("doc.txt", b"text");
    let found = probe(&path).expect("probe");
    let actor = Actor::new(UserId::new(), "owner@example.com");
    File::new(
        FileOwner::Task(TaskId::new()),
        name,
        ObjectKey::from_stored("k"),
        &found,
        StorageLocation::default(),
        &actor,
        Utc::now(),
    )
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_file_names_are_rejected(sandbox: Sandbox, #[case] name: &str) {
    let err = named(&sandbox, name).expect_err("blank name");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn file_names_are_trimmed(sandbox: Sandbox) {
    let file = named(&sandbox, " budget.xlsx ").expect("valid name");
    assert_eq!(file.name(), "budget.xlsx");
    assert!(file.is_live());
}

#[rstest]
#[case(50, true)]
#[case(51, false)]
fn file_names_are_bounded(sandbox: Sandbox, #[case] len: usize, #[case] valid: bool) {
    let name = "x".repeat(len);
    assert_eq!(named(&sandbox, &name).is_ok(), valid);
}

#[rstest]
fn owners_round_trip_through_storage_parts() {
    let owners = [
        FileOwner::Task(TaskId::new()),
        FileOwner::Comment(CommentId::new()),
        FileOwner::User(UserId::new()),
    ];
    for owner in owners {
        assert_eq!(FileOwner::from_parts(owner.kind(), owner.id()), Some(owner));
    }
    assert_eq!(FileOwner::from_parts("project", uuid::Uuid::new_v4()), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn latch_completes_after_every_unit() {
    let latch = CompletionLatch::new(2);
    latch.count_down(Ok(()));
    assert_eq!(latch.remaining(), 1);
    latch.count_down(Ok(()));

    assert!(latch.wait(Duration::from_secs(1)).await.is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn latch_surfaces_first_failure() {
    let latch = CompletionLatch::new(3);
    latch.count_down(Err(AttachmentServiceError::FileNotFound(FileId::new())));
    latch.count_down(Err(AttachmentServiceError::Stopped));
    latch.count_down(Ok(()));

    let result = latch.wait(Duration::from_secs(1)).await;

    assert!(matches!(
        result,
        Err(LatchFailure::Failed(AttachmentServiceError::FileNotFound(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn latch_times_out_on_missing_units() {
    let latch = CompletionLatch::new(2);
    latch.count_down(Ok(()));

    let result = latch.wait(Duration::from_millis(20)).await;

    assert!(matches!(result, Err(LatchFailure::TimedOut)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn zero_deadline_times_out_even_when_complete() {
    let latch = CompletionLatch::new(0);

    let result = latch.wait(Duration::ZERO).await;

    assert!(matches!(result, Err(LatchFailure::TimedOut)));
}
