//! Cancellable deferred transitions.
//!
//! Every delay in a session goes through one `Scheduler`. Terminating the
//! session cancels its token, which wakes any pending delay immediately with
//! `InterviewError::Cancelled`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{InterviewError, Result};

/// Session-scoped timer source backed by a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    token: CancellationToken,
}

impl Scheduler {
    /// Creates a scheduler with a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for `delay` unless the scheduler is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Cancelled` if cancelled before or during the wait.
    pub async fn after(&self, delay: Duration) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(InterviewError::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(InterviewError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Cancels every pending and future delay.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a handle to the underlying token.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
