//! ABOUTME: Error taxonomy for the Tandem coordinator
//! ABOUTME: Provides CoordinatorError, ErrorKind, and the crate-wide Result alias

use std::fmt;

/// Coarse classification of a failure, carried in every `StepResult.error`
/// and never leaked outside the coordinator as a bare exception.
///
/// `ConfigError`, `UnknownAgent`, and `UnknownAction` are raised only from
/// `submit`, before a workflow is given a `workflow_id` — callers see them
/// as submission failures, never as a `StepResult`. Every other variant is
/// captured into a `StepResult` and never propagates out of `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigError,
    UnknownAgent,
    UnknownAction,
    DataflowError,
    AgentFault,
    Timeout,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ConfigError => "config_error",
            Self::UnknownAgent => "unknown_agent",
            Self::UnknownAction => "unknown_action",
            Self::DataflowError => "dataflow_error",
            Self::AgentFault => "agent_fault",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Comprehensive error enum for all coordinator operations.
///
/// Each variant's `message` is safe for logs and public surfaces: it must
/// never embed a full parameter mapping or agent-supplied secret (§7).
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("unknown agent: {agent}")]
    UnknownAgent { agent: String },

    #[error("unknown action: {agent}.{action}")]
    UnknownAction { agent: String, action: String },

    #[error("dataflow error at step {step_index}: {message}")]
    Dataflow { step_index: usize, message: String },

    #[error("agent fault in {agent}.{action}: {message}")]
    AgentFault {
        agent: String,
        action: String,
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("deadline exceeded after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("operation cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("internal coordinator invariant violated: {message}")]
    Internal { message: String },
}

impl CoordinatorError {
    /// Classify this error per the §7 taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::ConfigError,
            Self::UnknownAgent { .. } => ErrorKind::UnknownAgent,
            Self::UnknownAction { .. } => ErrorKind::UnknownAction,
            Self::Dataflow { .. } => ErrorKind::DataflowError,
            Self::AgentFault { .. } => ErrorKind::AgentFault,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// True for the three variants that `submit` raises before a
    /// `workflow_id` exists, rather than folding into a `StepResult`.
    #[must_use]
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConfigError | ErrorKind::UnknownAgent | ErrorKind::UnknownAction
        )
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, CoordinatorError>;
