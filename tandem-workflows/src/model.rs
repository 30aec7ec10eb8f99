//! ABOUTME: StepResult / WorkflowResult — the symmetric output shape of spec §3, §6
//! ABOUTME: Immutable once emitted; serialized exactly as the CLI/host wire contract expects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tandem_core::{CoordinatorError, ErrorKind, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed,
    Timeout,
    Cancelled,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Ok,
    Failed,
    Timeout,
    Cancelled,
}

/// `ErrorKind` + message + optional cause chain, attached to a non-ok
/// `StepResult` (§3, §7). Never embeds full agent parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl From<&CoordinatorError> for ErrorInfo {
    fn from(e: &CoordinatorError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
            causes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub agent: String,
    pub action: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
}

impl WorkflowResult {
    /// §8: `status == ok` iff every non-skipped step is `ok`.
    #[must_use]
    pub fn is_internally_consistent(&self) -> bool {
        let every_nonskipped_ok = self
            .steps
            .iter()
            .filter(|s| s.status != StepStatus::Skipped)
            .all(|s| s.status == StepStatus::Ok);
        (self.status == WorkflowStatus::Ok) == every_nonskipped_ok
    }
}
