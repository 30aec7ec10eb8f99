//! ABOUTME: StatusEvent — the closed set of workflow lifecycle events (spec §3, §4.5)
//! ABOUTME: Payloads carry only correlation fields, never full agent parameters

use chrono::{DateTime, Utc};
use tandem_core::ErrorKind;

/// Brief, loggable summary of a terminal `StepResult`. Never carries the
/// full `output`/`error.message` — just enough for a subscriber to render
/// a progress view or a log line (§4.5, §7 "never leaks sensitive
/// parameter values").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcomeSummary {
    Ok,
    Failed(ErrorKind),
    Timeout,
    Cancelled,
    Skipped,
}

/// Brief summary of a terminal `WorkflowResult.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcomeSummary {
    Ok,
    Failed,
    Timeout,
    Cancelled,
}

/// One lifecycle event published by the runtime/executor (§3, §4.5).
///
/// The four variants are the complete set; no other event kind is ever
/// published. Events for one `workflow_id` are always delivered to a given
/// subscriber in the order listed here: `WorkflowStarted` first,
/// `WorkflowFinished` last, each `StepStarted(i)` before its matching
/// `StepFinished(i)`.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    WorkflowStarted {
        workflow_id: String,
        at: DateTime<Utc>,
    },
    StepStarted {
        workflow_id: String,
        step_index: usize,
        agent: String,
        action: String,
        at: DateTime<Utc>,
    },
    StepFinished {
        workflow_id: String,
        step_index: usize,
        status: StepOutcomeSummary,
        at: DateTime<Utc>,
    },
    WorkflowFinished {
        workflow_id: String,
        status: WorkflowOutcomeSummary,
        at: DateTime<Utc>,
    },
}

impl StatusEvent {
    #[must_use]
    pub fn workflow_id(&self) -> &str {
        match self {
            Self::WorkflowStarted { workflow_id, .. }
            | Self::StepStarted { workflow_id, .. }
            | Self::StepFinished { workflow_id, .. }
            | Self::WorkflowFinished { workflow_id, .. } => workflow_id,
        }
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::WorkflowStarted { at, .. }
            | Self::StepStarted { at, .. }
            | Self::StepFinished { at, .. }
            | Self::WorkflowFinished { at, .. } => *at,
        }
    }
}
