//! File records describing stored objects.

use super::{AttachmentDomainError, Dimensions, FileProbe, ObjectKey};
use crate::shared::{Actor, CommentId, FileId, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum display-name length in characters.
pub const MAX_FILE_NAME_LEN: usize = 50;

/// Entity a file is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum FileOwner {
    /// Task attachment.
    Task(TaskId),
    /// Comment attachment.
    Comment(CommentId),
    /// User photo rendition.
    User(UserId),
}

impl FileOwner {
    /// Returns the stored owner type.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Comment(_) => "comment",
            Self::User(_) => "user",
        }
    }

    /// Returns the owner identifier.
    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::Task(id) => id.into_inner(),
            Self::Comment(id) => id.into_inner(),
            Self::User(id) => id.into_inner(),
        }
    }

    /// Rebuilds an owner from its stored type and identifier.
    #[must_use]
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "task" => Some(Self::Task(TaskId::from_uuid(id))),
            "comment" => Some(Self::Comment(CommentId::from_uuid(id))),
            "user" => Some(Self::User(UserId::from_uuid(id))),
            _ => None,
        }
    }
}

/// Bucket and endpoint an object lives in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object store endpoint.
    pub endpoint: String,
}

/// Stored attachment or photo rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    id: FileId,
    owner: FileOwner,
    name: String,
    object_key: ObjectKey,
    size: u64,
    ext: String,
    mime: String,
    dimensions: Option<Dimensions>,
    resized: bool,
    location: StorageLocation,
    created_by: UserId,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    to_deleted_at: Option<DateTime<Utc>>,
}

/// Storage form of a [`File`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedFile {
    /// File identifier.
    pub id: FileId,
    /// Owning entity.
    pub owner: FileOwner,
    /// Display name.
    pub name: String,
    /// Object key.
    pub object_key: ObjectKey,
    /// Size in bytes.
    pub size: u64,
    /// Extension with its dot.
    pub ext: String,
    /// MIME type.
    pub mime: String,
    /// Pixel size for images.
    pub dimensions: Option<Dimensions>,
    /// Whether the object is a resized rendition.
    pub resized: bool,
    /// Bucket and endpoint.
    pub location: StorageLocation,
    /// Uploading user.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Removal completion time.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Removal start time.
    pub to_deleted_at: Option<DateTime<Utc>>,
}

impl File {
    /// Records an uploaded object.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentDomainError::InvalidName`] when the trimmed name
    /// is empty or longer than [`MAX_FILE_NAME_LEN`] characters.
    pub fn new(
        owner: FileOwner,
        name: &str,
        object_key: ObjectKey,
        probe: &FileProbe,
        location: StorageLocation,
        actor: &Actor,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AttachmentDomainError> {
        Ok(Self {
            id: FileId::new(),
            owner,
            name: validate_name(name)?,
            object_key,
            size: probe.size(),
            ext: probe.ext().to_owned(),
            mime: probe.mime().to_owned(),
            dimensions: probe.dimensions(),
            resized: false,
            location,
            created_by: actor.id(),
            created_at,
            deleted_at: None,
            to_deleted_at: None,
        })
    }

    /// Marks the record as a resized rendition.
    #[must_use]
    pub const fn resized(mut self, resized: bool) -> Self {
        self.resized = resized;
        self
    }

    /// Rebuilds a file from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedFile) -> Self {
        Self {
            id: data.id,
            owner: data.owner,
            name: data.name,
            object_key: data.object_key,
            size: data.size,
            ext: data.ext,
            mime: data.mime,
            dimensions: data.dimensions,
            resized: data.resized,
            location: data.location,
            created_by: data.created_by,
            created_at: data.created_at,
            deleted_at: data.deleted_at,
            to_deleted_at: data.to_deleted_at,
        }
    }

    /// Returns the storage form.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedFile {
        PersistedFile {
            id: self.id,
            owner: self.owner,
            name: self.name.clone(),
            object_key: self.object_key.clone(),
            size: self.size,
            ext: self.ext.clone(),
            mime: self.mime.clone(),
            dimensions: self.dimensions,
            resized: self.resized,
            location: self.location.clone(),
            created_by: self.created_by,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
            to_deleted_at: self.to_deleted_at,
        }
    }

    /// Returns the file identifier.
    #[must_use]
    pub const fn id(&self) -> FileId {
        self.id
    }

    /// Returns the owning entity.
    #[must_use]
    pub const fn owner(&self) -> FileOwner {
        self.owner
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the object key.
    #[must_use]
    pub const fn object_key(&self) -> &ObjectKey {
        &self.object_key
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the extension with its dot.
    #[must_use]
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Returns pixel dimensions for images.
    #[must_use]
    pub const fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Returns `true` for resized renditions.
    #[must_use]
    pub const fn is_resized(&self) -> bool {
        self.resized
    }

    /// Returns the bucket and endpoint.
    #[must_use]
    pub const fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Returns the uploading user.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when removal completed.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns when removal started.
    #[must_use]
    pub const fn to_deleted_at(&self) -> Option<DateTime<Utc>> {
        self.to_deleted_at
    }

    /// Returns `true` until removal completes.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Stamps the start of removal.
    pub const fn mark_for_delete(&mut self, at: DateTime<Utc>) {
        self.to_deleted_at = Some(at);
    }

    /// Stamps removal completion.
    pub const fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    /// Changes the display name.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentDomainError::InvalidName`] for empty or overlong
    /// names.
    pub fn rename(&mut self, name: &str) -> Result<(), AttachmentDomainError> {
        self.name = validate_name(name)?;
        Ok(())
    }
}

/// Trims a display name and checks its length.
///
/// # Errors
///
/// Returns [`AttachmentDomainError::InvalidName`] when the trimmed name is
/// empty or longer than [`MAX_FILE_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<String, AttachmentDomainError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > MAX_FILE_NAME_LEN {
        return Err(AttachmentDomainError::InvalidName(name.to_owned()));
    }
    Ok(trimmed.to_owned())
}
