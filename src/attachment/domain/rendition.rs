//! Photo renditions and object-store keys.

use crate::shared::{FederationId, TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A stored variant of a user photo, named by its target width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendition {
    /// The uploaded image, unscaled.
    Original,
    /// 50 px wide.
    Small,
    /// 200 px wide.
    Medium,
    /// 600 px wide.
    Large,
}

impl Rendition {
    /// Every rendition, in submission order.
    pub const ALL: [Self; 4] = [Self::Original, Self::Small, Self::Large, Self::Medium];

    /// Returns the target width; `0` for the original.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            Self::Original => 0,
            Self::Small => 50,
            Self::Medium => 200,
            Self::Large => 600,
        }
    }

    /// Looks up the rendition for a width.
    #[must_use]
    pub const fn from_width(width: u32) -> Option<Self> {
        match width {
            0 => Some(Self::Original),
            50 => Some(Self::Small),
            200 => Some(Self::Medium),
            600 => Some(Self::Large),
            _ => None,
        }
    }

    /// Returns `true` for renditions produced by the resize stage.
    #[must_use]
    pub const fn is_resized(self) -> bool {
        !matches!(self, Self::Original)
    }
}

/// Key of an object inside the attachment bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Key of a user photo rendition: `photos-<user>.jpg` for the original,
    /// `photos-<user>.w<width>.jpg` otherwise.
    #[must_use]
    pub fn photo(user: UserId, rendition: Rendition) -> Self {
        if rendition.is_resized() {
            Self(format!("photos-{user}.w{}.jpg", rendition.width()))
        } else {
            Self(format!("photos-{user}.jpg"))
        }
    }

    /// Fresh key for a task or comment attachment:
    /// `<federation>/task/<task>/<uuid><ext>`.
    ///
    /// `ext` carries its leading dot, or is empty.
    #[must_use]
    pub fn attachment(federation: FederationId, task: TaskId, ext: &str) -> Self {
        Self(format!(
            "{federation}/task/{task}/{object}{ext}",
            object = Uuid::new_v4()
        ))
    }

    /// Rebuilds a key read from storage.
    #[must_use]
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
