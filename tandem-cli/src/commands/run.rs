//! ABOUTME: `coord run <workflow.json>` — read, execute, print WorkflowResult as JSON, set exit code (spec §6)

use crate::demo_agents;
use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;
use tandem_agents::Registry;
use tandem_core::Context;
use tandem_workflows::{Coordinator, CoordinatorConfig, WorkflowDefinition, WorkflowStatus};
use tracing::info;

/// Process exit code conventions from §6: 0 on `ok`, 1 on any other terminal
/// status, 2 on a submission-time `ConfigError`.
pub async fn run(workflow_path: &Path, timeout_ms_override: Option<u64>) -> Result<i32> {
    let raw = tokio::fs::read_to_string(workflow_path)
        .await
        .with_context(|| format!("reading workflow definition from {}", workflow_path.display()))?;
    let mut definition: WorkflowDefinition =
        serde_json::from_str(&raw).with_context(|| format!("parsing workflow definition from {}", workflow_path.display()))?;
    if let Some(t) = timeout_ms_override {
        definition.workflow_timeout_ms = Some(t);
    }

    let registry = Arc::new(Registry::new());
    for agent in demo_agents::all() {
        registry.register(agent, false)?;
    }
    registry.start_all()?;
    info!(agents = registry.agent_names().len(), "registry ready");

    let coordinator = Coordinator::new(registry, CoordinatorConfig::default());
    let caller_ctx = Context::new(tandem_core::system_clock());

    match coordinator.submit(definition, caller_ctx).await {
        Ok(result) => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{json}");
            Ok(if result.status == WorkflowStatus::Ok { 0 } else { 1 })
        }
        Err(e) if e.kind() == tandem_core::ErrorKind::ConfigError => {
            eprintln!("{e}");
            Ok(2)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(1)
        }
    }
}
