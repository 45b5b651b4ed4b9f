//! Attachments stored next to tasks and journalled on removal.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{Workspace, workspace};
use atrium::activity::{
    domain::{ActivityKind, FileDeletedMeta},
    ports::ActivityPage,
};
use atrium::attachment::{
    adapters::{
        filesystem::FilesystemObjectStore,
        memory::{InMemoryFileRepository, InMemoryUrlCache},
    },
    ports::ObjectStore,
    services::{AttachmentService, BucketSettings},
};
use atrium::shared::BroadcastChangeFeed;
use camino::Utf8PathBuf;
use mockable::DefaultClock;
use rstest::rstest;
use tempfile::TempDir;

type FsAttachments = AttachmentService<
    FilesystemObjectStore<DefaultClock>,
    InMemoryFileRepository,
    InMemoryUrlCache<DefaultClock>,
    BroadcastChangeFeed,
    DefaultClock,
>;

struct Storage {
    _dir: TempDir,
    root: Utf8PathBuf,
    uploads: Utf8PathBuf,
    service: FsAttachments,
}

fn storage() -> Result<Storage, eyre::Report> {
    let dir = tempfile::tempdir()?;
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| eyre::eyre!("non utf-8 temp dir {}", path.display()))?;
    let root = base.join("objects");
    let uploads = base.join("uploads");
    std::fs::create_dir_all(&root)?;
    std::fs::create_dir_all(&uploads)?;

    let clock = Arc::new(DefaultClock);
    let store = FilesystemObjectStore::new(
        root.clone(),
        "https://files.example.net",
        "integration-secret",
        Arc::clone(&clock),
    );
    let bucket = BucketSettings {
        bucket: "crm".to_owned(),
        location: "eu-west-1".to_owned(),
        endpoint: "files.example.net".to_owned(),
        backend_url: "https://api.example.net".to_owned(),
    };
    let service = AttachmentService::new(
        Arc::new(store),
        Arc::new(InMemoryFileRepository::new()),
        Arc::new(InMemoryUrlCache::new(Arc::clone(&clock))),
        Arc::new(BroadcastChangeFeed::default()),
        clock,
        bucket,
        Duration::from_secs(300),
    );
    Ok(Storage {
        _dir: dir,
        root,
        uploads,
        service,
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uploaded_documents_land_on_disk_and_are_journalled_on_removal(
    workspace: Result<Workspace, eyre::Report>,
) -> Result<(), eyre::Report> {
    let workspace = workspace?;
    let storage = storage()?;
    let task = workspace
        .service
        .create_task(workspace.draft("Commission plant"))
        .await?;
    let source = storage.uploads.join("handover.pdf");
    std::fs::write(&source, b"%PDF-1.7 handover checklist")?;

    let file = storage
        .service
        .upload_task_file(
            workspace.project.federation,
            task.id(),
            "handover",
            &source,
            &workspace.actor,
        )
        .await?;

    let on_disk = storage.root.join("crm").join(file.object_key().as_str());
    eyre::ensure!(std::fs::read(&on_disk)? == b"%PDF-1.7 handover checklist", "object bytes");

    let links = storage.service.task_files(task.id(), true).await?;
    let link = links.first().ok_or_else(|| eyre::eyre!("file should be listed"))?;
    eyre::ensure!(
        link.url == format!("https://api.example.net/task/{}/upload/{}", task.id(), file.id()),
        "documents link to the backend, got {}",
        link.url
    );

    storage.service.delete_file(file.id()).await?;
    eyre::ensure!(!on_disk.exists(), "object should be removed");
    let meta = FileDeletedMeta {
        name: file.name().to_owned(),
        ext: file.ext().to_owned(),
        size: i64::try_from(file.size())?,
    };
    workspace
        .service
        .record_file_deleted(task.id(), &workspace.actor, &meta)
        .await?;

    let journal = workspace
        .service
        .list_activities(task.id(), ActivityPage::default())
        .await?;
    let last = journal
        .activities
        .last()
        .ok_or_else(|| eyre::eyre!("journal should not be empty"))?;
    eyre::ensure!(last.kind == ActivityKind::TaskFileWasDeleted, "unexpected {:?}", last.kind);
    eyre::ensure!(storage.service.task_files(task.id(), true).await?.is_empty(), "listing");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn previewable_images_get_signed_links(
    workspace: Result<Workspace, eyre::Report>,
) -> Result<(), eyre::Report> {
    let workspace = workspace?;
    let storage = storage()?;
    let task = workspace
        .service
        .create_task(workspace.draft("Survey roof"))
        .await?;
    let source = storage.uploads.join("roof.png");
    image::RgbImage::from_pixel(24, 16, image::Rgb([10, 120, 200])).save(&source)?;

    let file = storage
        .service
        .upload_task_file(
            workspace.project.federation,
            task.id(),
            "roof",
            &source,
            &workspace.actor,
        )
        .await?;
    let links = storage.service.task_files(task.id(), true).await?;
    let url = links
        .first()
        .map(|link| link.url.clone())
        .ok_or_else(|| eyre::eyre!("file should be listed"))?;

    let prefix = format!("https://files.example.net/crm/{}?expires=", file.object_key());
    eyre::ensure!(url.starts_with(&prefix), "unexpected link {url}");
    eyre::ensure!(url.contains("&filename=roof&signature="), "unexpected link {url}");

    let bucket_ready = FilesystemObjectStore::new(
        storage.root.clone(),
        "https://files.example.net",
        "integration-secret",
        Arc::new(DefaultClock),
    )
    .bucket_exists("crm")
    .await?;
    eyre::ensure!(bucket_ready, "bucket should have been created on first upload");
    Ok(())
}
