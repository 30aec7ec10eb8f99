//! ABOUTME: Coordinator — the top-level object the host constructs and calls (spec §6)
//! ABOUTME: Ties together Clock, Registry, Agent Runtime, Workflow Executor, and Status Bus

use crate::definition::WorkflowDefinition;
use crate::diagnostics::DiagnosticsSnapshot;
use crate::executor::WorkflowExecutor;
use crate::model::WorkflowResult;
use std::sync::Arc;
use std::time::Duration;
use tandem_agents::{AgentRuntime, Registry, DEFAULT_GRACE_PERIOD, DEFAULT_MAX_OUTPUT_BYTES};
use tandem_core::{system_clock, Context, Result, SharedClock};
use tandem_events::{EventBus, StatusHandler, SubscriptionHandle};

/// Global defaults the host configures once at construction (§6, §9
/// ambient-stack note B: a plain struct, not an external config file —
/// the teacher's heavyweight config-profile crate is out of scope here).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub default_step_timeout: Duration,
    pub default_grace_period: Duration,
    pub default_bus_buffer_size: usize,
    pub max_output_bytes: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_step_timeout: Duration::from_secs(30),
            default_grace_period: DEFAULT_GRACE_PERIOD,
            default_bus_buffer_size: 256,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// The coordinator object a host (CLI, web backend, GUI event loop)
/// constructs once and calls `submit` on repeatedly. Synchronous from the
/// caller's perspective: `submit` does not return until the run is
/// terminal; the coordinator imposes no threading policy of its own
/// (§6 — GUI hosts are expected to invoke it from a background task).
pub struct Coordinator {
    registry: Arc<Registry>,
    bus: Arc<EventBus>,
    executor: WorkflowExecutor,
}

impl Coordinator {
    #[must_use]
    pub fn new(registry: Arc<Registry>, config: CoordinatorConfig) -> Self {
        Self::with_clock(registry, config, system_clock())
    }

    #[must_use]
    pub fn with_clock(registry: Arc<Registry>, config: CoordinatorConfig, clock: SharedClock) -> Self {
        let bus = Arc::new(EventBus::new(config.default_bus_buffer_size));
        let runtime = Arc::new(AgentRuntime::new(config.default_grace_period, config.max_output_bytes));
        let executor = WorkflowExecutor::new(
            Arc::clone(&registry),
            runtime,
            Arc::clone(&bus),
            clock,
            config.default_step_timeout,
        );
        Self { registry, bus, executor }
    }

    /// Run a workflow to completion. See `WorkflowExecutor::run` for the
    /// submission-vs-`StepResult` failure split (§7).
    pub async fn submit(&self, workflow: WorkflowDefinition, caller_ctx: Context) -> Result<WorkflowResult> {
        self.executor.run(&workflow, caller_ctx).await
    }

    #[must_use]
    pub fn subscribe_status(&self, handler: impl StatusHandler) -> SubscriptionHandle {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.bus.unsubscribe(handle);
    }

    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.executor.diagnostics_snapshot()
    }

    #[must_use]
    pub fn active_workflow_ids(&self) -> Vec<String> {
        self.executor.active_workflow_ids()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
