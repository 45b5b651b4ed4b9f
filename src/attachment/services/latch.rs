//! Countdown shared by the renditions of one upload.

use super::AttachmentServiceError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Why a latch wait ended without every unit succeeding.
#[derive(Debug)]
pub enum LatchFailure {
    /// The deadline elapsed first.
    TimedOut,
    /// Every unit finished and at least one failed; holds the first error.
    Failed(AttachmentServiceError),
}

/// Completion latch counting terminal per-unit outcomes.
///
/// Every unit counts down exactly once, whether it succeeded or failed, and
/// the first failure is kept for the waiter.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: watch::Sender<usize>,
    first_error: Mutex<Option<AttachmentServiceError>>,
}

impl CompletionLatch {
    /// Creates a latch expecting `units` outcomes.
    #[must_use]
    pub fn new(units: usize) -> Self {
        let (remaining, _) = watch::channel(units);
        Self {
            remaining,
            first_error: Mutex::new(None),
        }
    }

    /// Returns the number of outstanding units.
    #[must_use]
    pub fn remaining(&self) -> usize {
        *self.remaining.borrow()
    }

    /// Records one unit's outcome.
    pub fn count_down(&self, outcome: Result<(), AttachmentServiceError>) {
        if let Err(err) = outcome {
            let mut slot = self
                .first_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.remaining
            .send_modify(|remaining| *remaining = remaining.saturating_sub(1));
    }

    /// Waits until every unit reported or `timeout` elapsed.
    ///
    /// A zero `timeout` fails at once.
    ///
    /// # Errors
    ///
    /// Returns [`LatchFailure::TimedOut`] when the deadline passes first and
    /// [`LatchFailure::Failed`] with the first recorded error otherwise.
    pub async fn wait(&self, timeout: Duration) -> Result<(), LatchFailure> {
        if timeout.is_zero() {
            return Err(LatchFailure::TimedOut);
        }
        let mut receiver = self.remaining.subscribe();
        match tokio::time::timeout(timeout, receiver.wait_for(|remaining| *remaining == 0)).await {
            Err(_) => return Err(LatchFailure::TimedOut),
            Ok(Err(_)) => return Err(LatchFailure::Failed(AttachmentServiceError::Stopped)),
            Ok(Ok(_)) => {}
        }
        let first = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        first.map_or(Ok(()), |err| Err(LatchFailure::Failed(err)))
    }
}
