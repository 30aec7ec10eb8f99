//! Measures `Coordinator::submit` overhead on minimal workflows — the cost the
//! coordinator itself adds on top of agent work. Separate from `tests/scenarios.rs`,
//! which checks correctness rather than latency.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tandem_agents::Registry;
use tandem_core::{params, Action, Agent, Context, Params, Result, StatusPublisher};
use tandem_workflows::{Coordinator, CoordinatorConfig, OnStepFailure, WorkflowDefinition, WorkflowStep};
use tokio::runtime::Runtime;

struct NoopAction;

#[async_trait]
impl Action for NoopAction {
    fn name(&self) -> &str {
        "noop"
    }

    async fn invoke(&self, _ctx: &Context, _params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        Ok(params([("ok", true)]))
    }
}

struct NoopAgent {
    action: NoopAction,
}

impl Agent for NoopAgent {
    fn name(&self) -> &str {
        "noop-agent"
    }

    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.action]
    }
}

fn registry() -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    registry.register(Arc::new(NoopAgent { action: NoopAction }), false).unwrap();
    registry.start_all().unwrap();
    registry
}

fn single_step_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        steps: vec![WorkflowStep {
            agent: "noop-agent".to_string(),
            action: "noop".to_string(),
            params: Params::new(),
            bindings: vec![],
            timeout_ms: None,
            group: None,
        }],
        workflow_timeout_ms: None,
        on_step_failure: OnStepFailure::default(),
    }
}

fn ten_step_sequential_workflow() -> WorkflowDefinition {
    let steps = (0..10)
        .map(|_| WorkflowStep {
            agent: "noop-agent".to_string(),
            action: "noop".to_string(),
            params: Params::new(),
            bindings: vec![],
            timeout_ms: None,
            group: None,
        })
        .collect();
    WorkflowDefinition { steps, workflow_timeout_ms: None, on_step_failure: OnStepFailure::default() }
}

fn bench_single_step(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = registry();
    let coordinator = Coordinator::new(registry, CoordinatorConfig::default());

    c.bench_function("submit_single_noop_step", |b| {
        b.to_async(&rt).iter(|| async {
            let def = black_box(single_step_workflow());
            let result = coordinator.submit(def, Context::new(tandem_core::system_clock())).await.unwrap();
            black_box(result)
        });
    });
}

fn bench_ten_sequential_steps(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = registry();
    let coordinator = Coordinator::new(registry, CoordinatorConfig::default());

    c.bench_function("submit_ten_sequential_noop_steps", |b| {
        b.to_async(&rt).iter(|| async {
            let def = black_box(ten_step_sequential_workflow());
            let result = coordinator.submit(def, Context::new(tandem_core::system_clock())).await.unwrap();
            black_box(result)
        });
    });
}

criterion_group!(benches, bench_single_step, bench_ten_sequential_steps);
criterion_main!(benches);
