//! ABOUTME: Context value carrying deadline and cancellation through nested calls (§4.1)
//! ABOUTME: Contexts are derivable: a child narrows the deadline and inherits cancellation

use crate::clock::SharedClock;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Carries a deadline, a cancellation signal, and correlation fields
/// through the coordinator's call graph. A child context's deadline is
/// the earlier of its parent's and its own; cancelling a parent always
/// cancels every derived child (cancellation is cooperative, idempotent,
/// and sticky).
#[derive(Debug, Clone)]
pub struct Context {
    clock: SharedClock,
    deadline: Option<Instant>,
    cancellation: CancellationToken,
    pub workflow_id: Option<String>,
    pub caller_id: Option<String>,
}

impl Context {
    /// Root context for a caller with no deadline and a fresh cancellation
    /// signal.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            deadline: None,
            cancellation: CancellationToken::new(),
            workflow_id: None,
            caller_id: None,
        }
    }

    #[must_use]
    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = self.clock.now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(candidate),
            None => candidate,
        });
        self
    }

    /// Derive a child context for one step/invocation: the child's
    /// deadline is `min(parent deadline, local deadline)`, and the child's
    /// cancellation signal fires whenever the parent's does (in addition
    /// to any cancellation requested on the child alone).
    #[must_use]
    pub fn child(&self, workflow_id: Option<String>) -> Self {
        Self {
            clock: self.clock.clone(),
            deadline: self.deadline,
            cancellation: self.cancellation.child_token(),
            workflow_id: workflow_id.or_else(|| self.workflow_id.clone()),
            caller_id: self.caller_id.clone(),
        }
    }

    /// Derive a child context with an additional local timeout, narrowing
    /// whatever deadline the parent already carries.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = self.clock.now() + timeout;
        let deadline = Some(match self.deadline {
            Some(existing) => existing.min(candidate),
            None => candidate,
        });
        Self {
            clock: self.clock.clone(),
            deadline,
            cancellation: self.cancellation.child_token(),
            workflow_id: self.workflow_id.clone(),
            caller_id: self.caller_id.clone(),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Remaining time until the deadline elapses, or `None` if there is no
    /// deadline. Never negative: a past deadline yields `Duration::ZERO`.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(self.clock.now()))
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Request cancellation. Idempotent and sticky: once cancelled, a
    /// context (and every context derived from it) stays cancelled.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// The raw cancellation token, for callers that need to `select!`
    /// against `cancelled()` directly.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }
}
