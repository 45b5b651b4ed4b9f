//! Built-in task statuses and status change requests.

use crate::shared::{Actor, Language, StopId};

/// Largest status a task may hold.
pub const MAX_STATUS: i32 = 10;

/// Statuses every project understands without a custom catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinStatus {
    /// Freshly created, not yet triaged.
    Unknown,
    /// Triaged and waiting for work.
    New,
    /// Being worked on.
    InWork,
    /// Paused.
    Hold,
    /// Waiting for review.
    NeedReview,
    /// Completed.
    Done,
    /// Cancelled.
    Cancel,
}

impl BuiltinStatus {
    /// Every built-in status in code order.
    pub const ALL: [Self; 7] = [
        Self::Unknown,
        Self::New,
        Self::InWork,
        Self::Hold,
        Self::NeedReview,
        Self::Done,
        Self::Cancel,
    ];

    /// Returns the stored integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::New => 1,
            Self::InWork => 2,
            Self::Hold => 3,
            Self::NeedReview => 4,
            Self::Done => 5,
            Self::Cancel => 6,
        }
    }

    /// Looks up a built-in status by code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::New),
            2 => Some(Self::InWork),
            3 => Some(Self::Hold),
            4 => Some(Self::NeedReview),
            5 => Some(Self::Done),
            6 => Some(Self::Cancel),
            _ => None,
        }
    }

    /// Returns the display label.
    #[must_use]
    pub const fn label(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::En, Self::Unknown) => "Unprocessed",
            (Language::En, Self::New) => "New",
            (Language::En, Self::InWork) => "In work",
            (Language::En, Self::Hold) => "On hold",
            (Language::En, Self::NeedReview) => "Needs review",
            (Language::En, Self::Done) => "Done",
            (Language::En, Self::Cancel) => "Cancelled",
            (Language::Ru, Self::Unknown) => "Необработана",
            (Language::Ru, Self::New) => "Новая",
            (Language::Ru, Self::InWork) => "В работе",
            (Language::Ru, Self::Hold) => "Приостановлена",
            (Language::Ru, Self::NeedReview) => "На проверке",
            (Language::Ru, Self::Done) => "Завершена",
            (Language::Ru, Self::Cancel) => "Отменена",
        }
    }
}

/// Request to move a task to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Requested status.
    pub target: i32,
    /// Reason left by the actor; may be empty.
    pub comment: String,
    /// User making the change.
    pub actor: Actor,
}

impl StatusChange {
    /// Creates a change without a comment.
    #[must_use]
    pub const fn new(target: i32, actor: Actor) -> Self {
        Self {
            target,
            comment: String::new(),
            actor,
        }
    }

    /// Attaches a reason.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Outcome of an accepted status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// Stop appended to the task history.
    pub stop: StopId,
    /// Status labels traversed from the old status to the new one.
    pub path: Vec<String>,
}
