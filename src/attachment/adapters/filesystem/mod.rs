//! Object store rooted in a local directory.
//!
//! Buckets are subdirectories of the root and keys are relative paths inside
//! them. Download links are signed with SHA-256 over the secret, the object
//! coordinates, the expiry, and the suggested file name.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::Clock;
use sha2::{Digest, Sha256};
use std::io::ErrorKind as IoErrorKind;
use std::sync::Arc;
use std::time::Duration;

use crate::attachment::{
    domain::{ObjectKey, local},
    ports::{ObjectStore, ObjectStoreError, ObjectStoreResult},
};

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct FilesystemObjectStore<C: Clock + Send + Sync> {
    root: Utf8PathBuf,
    public_url: String,
    secret: String,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> FilesystemObjectStore<C> {
    /// Creates a store under an existing `root` directory.
    #[must_use]
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        public_url: impl Into<String>,
        secret: impl Into<String>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
            secret: secret.into(),
            clock,
        }
    }

    /// Returns `true` when `signature` matches an unexpired link.
    #[must_use]
    pub fn verify_signature(
        &self,
        bucket: &str,
        key: &str,
        expires_at: i64,
        download_name: &str,
        signature: &str,
    ) -> bool {
        expires_at > self.clock.utc().timestamp()
            && sign(&self.secret, bucket, key, expires_at, download_name) == signature
    }

    async fn run_blocking<F, T>(&self, f: F) -> ObjectStoreResult<T>
    where
        F: FnOnce(&Dir) -> ObjectStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let dir = Dir::open_ambient_dir(&root, ambient_authority())
                .map_err(ObjectStoreError::backend)?;
            f(&dir)
        })
        .await
        .map_err(ObjectStoreError::backend)?
    }
}

fn open_bucket(root: &Dir, bucket: &str) -> ObjectStoreResult<Dir> {
    root.open_dir(bucket).map_err(|err| match err.kind() {
        IoErrorKind::NotFound => ObjectStoreError::NoSuchBucket(bucket.to_owned()),
        _ => ObjectStoreError::backend(err),
    })
}

fn sign(secret: &str, bucket: &str, key: &str, expires_at: i64, download_name: &str) -> String {
    let expiry = expires_at.to_string();
    let mut hasher = Sha256::new();
    for part in [secret, bucket, key, expiry.as_str(), download_name] {
        hasher.update(part.as_bytes());
        hasher.update([0_u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn encode_component(value: &str) -> String {
    value
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                char::from(byte).to_string()
            }
            _ => format!("%{byte:02X}"),
        })
        .collect()
}

#[async_trait]
impl<C: Clock + Send + Sync + 'static> ObjectStore for FilesystemObjectStore<C> {
    async fn make_bucket(&self, bucket: &str, location: &str) -> ObjectStoreResult<()> {
        let name = bucket.to_owned();
        self.run_blocking(move |root| {
            root.create_dir(&name).map_err(|err| match err.kind() {
                IoErrorKind::AlreadyExists => ObjectStoreError::BucketExists(name.clone()),
                _ => ObjectStoreError::backend(err),
            })
        })
        .await?;
        tracing::info!(bucket, location, "created bucket");
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool> {
        let name = bucket.to_owned();
        self.run_blocking(move |root| Ok(root.is_dir(&name))).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &ObjectKey,
        source: &Utf8Path,
        content_type: &str,
    ) -> ObjectStoreResult<u64> {
        let name = bucket.to_owned();
        let target = Utf8PathBuf::from(key.as_str());
        let path = source.to_owned();
        let size = self
            .run_blocking(move |root| {
                let bytes = local::read_file(&path).map_err(ObjectStoreError::backend)?;
                let objects = open_bucket(root, &name)?;
                if let Some(parent) = target.parent().filter(|dir| !dir.as_str().is_empty()) {
                    objects
                        .create_dir_all(parent)
                        .map_err(ObjectStoreError::backend)?;
                }
                objects
                    .write(&target, &bytes)
                    .map_err(ObjectStoreError::backend)?;
                u64::try_from(bytes.len()).map_err(ObjectStoreError::backend)
            })
            .await?;
        tracing::debug!(bucket, key = %key, size, content_type, "stored object");
        Ok(size)
    }

    async fn remove_object(&self, bucket: &str, key: &ObjectKey) -> ObjectStoreResult<()> {
        let name = bucket.to_owned();
        let target = key.as_str().to_owned();
        self.run_blocking(move |root| {
            let objects = open_bucket(root, &name)?;
            match objects.remove_file(&target) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
                Err(err) => Err(ObjectStoreError::backend(err)),
            }
        })
        .await
    }

    async fn presigned_get_object(
        &self,
        bucket: &str,
        key: &ObjectKey,
        expires: Duration,
        download_name: &str,
    ) -> ObjectStoreResult<String> {
        if !self.bucket_exists(bucket).await? {
            return Err(ObjectStoreError::NoSuchBucket(bucket.to_owned()));
        }
        let lifetime = i64::try_from(expires.as_secs()).map_err(ObjectStoreError::backend)?;
        let expires_at = self.clock.utc().timestamp().saturating_add(lifetime);
        let signature = sign(&self.secret, bucket, key.as_str(), expires_at, download_name);
        Ok(format!(
            "{base}/{bucket}/{key}?expires={expires_at}&filename={name}&signature={signature}",
            base = self.public_url.trim_end_matches('/'),
            name = encode_component(download_name),
        ))
    }
}
