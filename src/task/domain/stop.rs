//! Status history entries.

use crate::shared::{Actor, StopId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted status change in a task's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// Entry identifier.
    #[serde(rename = "uuid")]
    pub id: StopId,
    /// When the change happened.
    pub created_at: DateTime<Utc>,
    /// Status entered.
    pub status_id: i32,
    /// Display name of the status entered.
    pub status_name: String,
    /// Reason given by the actor.
    pub comment: String,
    /// Email of the actor.
    pub created_by: String,
    /// Identifier of the actor.
    #[serde(rename = "created_by_uuid")]
    pub created_by_id: UserId,
}

impl Stop {
    /// Creates an entry for `actor` entering `status_id`.
    #[must_use]
    pub fn new(
        actor: &Actor,
        status_id: i32,
        status_name: impl Into<String>,
        comment: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StopId::new(),
            created_at,
            status_id,
            status_name: status_name.into(),
            comment: comment.into(),
            created_by: actor.email().to_owned(),
            created_by_id: actor.id(),
        }
    }
}
