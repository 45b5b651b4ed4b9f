//! The authenticated user performing a mutation.

use super::UserId;
use serde::{Deserialize, Serialize};

/// User on whose behalf a change is made.
///
/// Authentication happens outside the core; the actor is handed in already
/// resolved and is copied into stops, activities, and file records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    email: String,
}

impl Actor {
    /// Creates an actor from an identifier and a login email.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}
