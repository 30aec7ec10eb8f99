//! ABOUTME: Workflow Executor (§4.4) and Coordinator (§6) — the top two layers of the coordinator
//! ABOUTME: Depends on tandem-core, tandem-agents, and tandem-events; owns no agent implementations

pub mod coordinator;
pub mod definition;
pub mod diagnostics;
pub mod executor;
pub mod model;

#[cfg(test)]
mod test_utils;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use definition::{Binding, OnStepFailure, RetryPolicy, SimplePolicy, WorkflowDefinition, WorkflowStep};
pub use diagnostics::DiagnosticsSnapshot;
pub use executor::WorkflowExecutor;
pub use model::{ErrorInfo, StepResult, StepStatus, WorkflowResult, WorkflowStatus};
