//! ABOUTME: WorkflowDefinition — the serialization contract of spec §6
//! ABOUTME: Unrecognized keys are rejected via serde(deny_unknown_fields); validate() enforces §4.4 edge cases

use serde::{Deserialize, Serialize};
use tandem_core::{CoordinatorError, Params, Result};

/// One input binding: `param_key ← previous_step_output_field` (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binding {
    pub param: String,
    pub from_step: usize,
    pub from_field: String,
}

/// One entry in a `WorkflowDefinition.steps` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowStep {
    pub agent: String,
    pub action: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub group: Option<String>,
}

/// `retry(n, backoff)` policy parameters (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff_ms: u64,
    #[serde(default)]
    pub exponential: bool,
}

/// Simple (non-retrying) failure policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimplePolicy {
    Abort,
    Continue,
}

/// `on_step_failure`: either a bare string (`"abort"` / `"continue"`) or an
/// object `{ "retry": { ... } }` (§6 serialization contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OnStepFailure {
    Simple(SimplePolicy),
    Retry { retry: RetryPolicy },
}

impl Default for OnStepFailure {
    fn default() -> Self {
        Self::Simple(SimplePolicy::Abort)
    }
}

impl OnStepFailure {
    #[must_use]
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        match self {
            Self::Retry { retry } => Some(retry),
            Self::Simple(_) => None,
        }
    }

    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Simple(SimplePolicy::Abort) | Self::Retry { .. })
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Simple(SimplePolicy::Continue))
    }
}

/// An ordered plan of steps to be executed by the coordinator (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowDefinition {
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub workflow_timeout_ms: Option<u64>,
    #[serde(default)]
    pub on_step_failure: OnStepFailure,
}

impl WorkflowDefinition {
    /// Structural validation raised at submission time, before a
    /// `workflow_id` is assigned (§4.4 edge cases, §7).
    ///
    /// Agent/action existence is validated separately by the caller
    /// (the executor consults the registry, which this crate does not
    /// depend on at the type level) — this only checks what the
    /// definition can tell about itself.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(CoordinatorError::config("workflow must have at least one step"));
        }
        if let Some(t) = self.workflow_timeout_ms {
            if t == 0 {
                return Err(CoordinatorError::config("workflow_timeout_ms must be > 0"));
            }
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.agent.is_empty() {
                return Err(CoordinatorError::config(format!("step {i}: agent must not be empty")));
            }
            if step.action.is_empty() {
                return Err(CoordinatorError::config(format!("step {i}: action must not be empty")));
            }
            if matches!(step.timeout_ms, Some(0)) {
                return Err(CoordinatorError::config(format!("step {i}: timeout_ms must be > 0")));
            }
            for binding in &step.bindings {
                if binding.from_step >= i {
                    return Err(CoordinatorError::config(format!(
                        "step {i}: binding '{}' must reference a strictly earlier step (got {})",
                        binding.param, binding.from_step
                    )));
                }
            }
        }
        if let Some(retry) = self.on_step_failure.retry_policy() {
            if retry.max_attempts < 1 {
                return Err(CoordinatorError::config("retry max_attempts must be >= 1"));
            }
        }
        Ok(())
    }
}
