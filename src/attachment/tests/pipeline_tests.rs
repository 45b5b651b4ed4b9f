//! Photo pipeline tests: renditions, timeouts, shutdown, and removal.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Sandbox, bucket, decoded_width};
use crate::attachment::{
    adapters::memory::{InMemoryFileRepository, InMemoryObjectStore},
    domain::{FileOwner, ObjectKey, Rendition},
    ports::{FileRepository, MockObjectStore, ObjectStore, ObjectStoreError},
    services::{AttachmentPipeline, AttachmentServiceError, PipelineConfig},
};
use crate::shared::{Actor, Classify, ErrorKind, UserId};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn sandbox() -> Sandbox {
    Sandbox::new()
}

fn config(parallel: usize, upload_timeout: Duration) -> PipelineConfig {
    PipelineConfig {
        parallel_resize: parallel,
        parallel_upload: parallel,
        queue_capacity: 8,
        upload_timeout,
    }
}

fn start<O: ObjectStore + 'static>(
    store: Arc<O>,
    files: Arc<InMemoryFileRepository>,
    pipeline: PipelineConfig,
) -> AttachmentPipeline<O, InMemoryFileRepository, DefaultClock> {
    AttachmentPipeline::start(pipeline, store, files, Arc::new(DefaultClock), bucket())
}

fn actor(user: UserId) -> Actor {
    Actor::new(user, "member@example.com")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn photo_upload_stores_every_rendition(sandbox: Sandbox) {
    let store = Arc::new(InMemoryObjectStore::default());
    let files = Arc::new(InMemoryFileRepository::new());
    let pipeline = start(
        Arc::clone(&store),
        Arc::clone(&files),
        config(2, Duration::from_secs(30)),
    );
    let source = sandbox.image("avatar.png", 800, 600);
    let user = UserId::new();

    pipeline
        .upload_photo(&source, user, &actor(user))
        .await
        .expect("photo should upload");

    let mut expected = vec![
        format!("photos-{user}.jpg"),
        format!("photos-{user}.w200.jpg"),
        format!("photos-{user}.w50.jpg"),
        format!("photos-{user}.w600.jpg"),
    ];
    expected.sort();
    assert_eq!(store.keys("attachments").expect("keys"), expected);

    let small = store
        .object("attachments", &format!("photos-{user}.w50.jpg"))
        .expect("read")
        .expect("small rendition stored");
    assert_eq!(small.content_type, "image/jpeg");
    assert_eq!(decoded_width(&small.bytes), 50);
    let original = store
        .object("attachments", &format!("photos-{user}.jpg"))
        .expect("read")
        .expect("original stored");
    assert_eq!(original.content_type, "image/png");
    assert_eq!(decoded_width(&original.bytes), 800);

    let rows = files
        .list_for_owner(FileOwner::User(user))
        .await
        .expect("rows listed");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.iter().filter(|row| row.is_resized()).count(), 3);
    assert!(rows.iter().all(|row| row.name() == "avatar"));

    assert!(pipeline.small_photo_url(user).ends_with(".w50.jpg"));
    assert_eq!(
        pipeline.medium_photo_url(user),
        format!("https://attachments.storage.example.net/photos-{user}.w200.jpg")
    );
    assert!(pipeline.large_photo_url(user).ends_with(".w600.jpg"));
    pipeline.stop().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_images_are_rejected_before_queueing(sandbox: Sandbox) {
    let store = Arc::new(InMemoryObjectStore::default());
    let pipeline = start(
        Arc::clone(&store),
        Arc::new(InMemoryFileRepository::new()),
        config(1, Duration::from_secs(5)),
    );
    let source = sandbox.file("resume.pdf", b"%PDF-1.4 body");
    let user = UserId::new();

    let err = pipeline
        .upload_photo(&source, user, &actor(user))
        .await
        .expect_err("pdf is not a photo");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("file is not image"));
    assert!(store.keys("attachments").expect("keys").is_empty());
    pipeline.stop().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn zero_deadline_reports_timeout(sandbox: Sandbox) {
    let pipeline = start(
        Arc::new(InMemoryObjectStore::default()),
        Arc::new(InMemoryFileRepository::new()),
        config(1, Duration::ZERO),
    );
    let source = sandbox.image("avatar.png", 64, 48);
    let user = UserId::new();

    let err = pipeline
        .upload_photo(&source, user, &actor(user))
        .await
        .expect_err("deadline is zero");

    assert!(matches!(err, AttachmentServiceError::Timeout { .. }));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().starts_with("upload photo timeout"));
    pipeline.stop().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_rendition_surfaces_first_error(sandbox: Sandbox) {
    let probes = Arc::new(AtomicUsize::new(0));
    let mut store = MockObjectStore::new();
    store
        .expect_make_bucket()
        .returning(|_, _| Err(ObjectStoreError::backend(std::io::Error::other("denied"))));
    let seen = Arc::clone(&probes);
    store
        .expect_bucket_exists()
        .returning(move |_| Ok(seen.fetch_add(1, Ordering::SeqCst) > 0));
    store.expect_put_object().returning(|_, _, _, _| Ok(128));

    let files = Arc::new(InMemoryFileRepository::new());
    let pipeline = start(
        Arc::new(store),
        Arc::clone(&files),
        config(1, Duration::from_secs(30)),
    );
    let source = sandbox.image("avatar.png", 120, 90);
    let user = UserId::new();

    let err = pipeline
        .upload_photo(&source, user, &actor(user))
        .await
        .expect_err("first rendition cannot reach its bucket");

    assert!(matches!(err, AttachmentServiceError::Store(_)));
    assert_eq!(probes.load(Ordering::SeqCst), 4);
    let rows = files
        .list_for_owner(FileOwner::User(user))
        .await
        .expect("rows listed");
    let original = ObjectKey::photo(user, Rendition::Original);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.object_key() != &original));
    pipeline.stop().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopped_pipeline_refuses_uploads(sandbox: Sandbox) {
    let pipeline = start(
        Arc::new(InMemoryObjectStore::default()),
        Arc::new(InMemoryFileRepository::new()),
        config(1, Duration::from_secs(5)),
    );
    assert!(pipeline.is_running());

    pipeline.stop().await;
    let source = sandbox.image("avatar.png", 32, 32);
    let user = UserId::new();
    let result = pipeline.upload_photo(&source, user, &actor(user)).await;

    assert!(!pipeline.is_running());
    assert!(matches!(result, Err(AttachmentServiceError::Stopped)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_photo_removes_objects_and_rows(sandbox: Sandbox) {
    let store = Arc::new(InMemoryObjectStore::default());
    let files = Arc::new(InMemoryFileRepository::new());
    let pipeline = start(
        Arc::clone(&store),
        Arc::clone(&files),
        config(2, Duration::from_secs(30)),
    );
    let source = sandbox.image("avatar.png", 300, 200);
    let user = UserId::new();
    pipeline
        .upload_photo(&source, user, &actor(user))
        .await
        .expect("photo should upload");
    let uploaded = files
        .list_for_owner(FileOwner::User(user))
        .await
        .expect("rows listed");

    pipeline.delete_photo(user).await.expect("photo removed");

    assert!(store.keys("attachments").expect("keys").is_empty());
    for row in uploaded {
        let retired = files
            .find_with_deleted(row.id())
            .expect("lookup")
            .expect("row kept");
        assert!(retired.deleted_at().is_some());
        assert!(retired.to_deleted_at().is_some());
    }
    pipeline.stop().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_photo_removal_lists_failed_keys() {
    let mut store = MockObjectStore::new();
    store.expect_remove_object().returning(|_, key| {
        if key.as_str().ends_with(".w50.jpg") {
            Err(ObjectStoreError::backend(std::io::Error::other("timeout")))
        } else {
            Ok(())
        }
    });
    let pipeline = start(
        Arc::new(store),
        Arc::new(InMemoryFileRepository::new()),
        config(1, Duration::from_secs(5)),
    );
    let user = UserId::new();

    let err = pipeline
        .delete_photo(user)
        .await
        .expect_err("small rendition fails");

    let AttachmentServiceError::PhotoDeletion { failures } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures.first().map(|(key, _)| key.clone()),
        Some(ObjectKey::photo(user, Rendition::Small))
    );
    assert_eq!(err.kind(), ErrorKind::Transient);
    pipeline.stop().await;
}
