//! Task roles and the derived participant set.
//!
//! Roles hold a user email or identifier as text; an empty string means the
//! role is unassigned.

use super::ancestry::dedup;
use serde::{Deserialize, Serialize};

/// People attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Team {
    /// Accountable person.
    pub responsible: String,
    /// Person doing the work.
    pub implementer: String,
    /// Supervising manager.
    pub manager: String,
    /// Helpers; deduplicated, never empty strings.
    pub co_workers: Vec<String>,
    /// Observers; not participants.
    pub watchers: Vec<String>,
}

impl Team {
    /// Returns a copy with member lists cleaned of blanks and repeats.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.co_workers = dedup_non_empty(&self.co_workers);
        self.watchers = dedup_non_empty(&self.watchers);
        self
    }
}

/// Partial team update; `None` leaves a role untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamChange {
    /// New responsible person.
    pub responsible: Option<String>,
    /// New implementer.
    pub implementer: Option<String>,
    /// New manager.
    pub manager: Option<String>,
    /// Replacement co-worker list.
    pub co_workers: Option<Vec<String>>,
    /// Replacement watcher list.
    pub watchers: Option<Vec<String>>,
}

impl TeamChange {
    /// Sets the responsible person.
    #[must_use]
    pub fn responsible(mut self, who: impl Into<String>) -> Self {
        self.responsible = Some(who.into());
        self
    }

    /// Sets the implementer.
    #[must_use]
    pub fn implementer(mut self, who: impl Into<String>) -> Self {
        self.implementer = Some(who.into());
        self
    }

    /// Sets the manager.
    #[must_use]
    pub fn manager(mut self, who: impl Into<String>) -> Self {
        self.manager = Some(who.into());
        self
    }

    /// Replaces the co-workers.
    #[must_use]
    pub fn co_workers<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.co_workers = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the watchers.
    #[must_use]
    pub fn watchers<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watchers = Some(members.into_iter().map(Into::into).collect());
        self
    }
}

/// Drops empty strings and repeats, keeping first occurrences.
#[must_use]
pub fn dedup_non_empty(items: &[String]) -> Vec<String> {
    let filled: Vec<String> = items.iter().filter(|item| !item.is_empty()).cloned().collect();
    dedup(&filled)
}

/// Computes the participant set: creator, the three roles and co-workers.
#[must_use]
pub fn participants(creator: &str, team: &Team) -> Vec<String> {
    let mut members = vec![
        creator.to_owned(),
        team.implementer.clone(),
        team.responsible.clone(),
        team.manager.clone(),
    ];
    members.extend(team.co_workers.iter().cloned());
    dedup_non_empty(&members)
}
