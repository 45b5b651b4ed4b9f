//! Fire-and-forget change notifications for cache invalidators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Topic every change event is published on.
pub const UPDATE_TOPIC: &str = "update";

/// Kind of entity a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedEntity {
    /// A task row.
    Task,
    /// A company field definition.
    CompanyField,
    /// A project field projection.
    ProjectField,
    /// A file row.
    File,
}

/// Notification that an entity changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Changed entity kind.
    pub entity: ChangedEntity,
    /// Changed entity identifier.
    pub id: Uuid,
}

impl ChangeEvent {
    /// Creates an event for `entity` with identifier `id`.
    #[must_use]
    pub fn new(entity: ChangedEntity, id: impl AsRef<Uuid>) -> Self {
        Self {
            entity,
            id: *id.as_ref(),
        }
    }
}

/// Publisher of change events.
///
/// Publishing never fails from the caller's perspective; delivery problems are
/// logged by the implementation.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Publishes an event on [`UPDATE_TOPIC`].
    async fn publish(&self, event: ChangeEvent);
}

/// In-process change feed backed by a `tokio` broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeFeed {
    /// Creates a feed retaining at most `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    async fn publish(&self, event: ChangeEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::debug!(topic = UPDATE_TOPIC, event = ?err.0, "no change feed subscribers");
        }
    }
}
