//! ABOUTME: Sample agents and workflow fixtures used across this crate's tests (spec §8 scenarios)
//! ABOUTME: Not part of the public API surface beyond #[cfg(test)]/dev-dependency use

#![cfg(test)]

use crate::definition::{Binding, OnStepFailure, RetryPolicy, SimplePolicy, WorkflowDefinition, WorkflowStep};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tandem_core::{params, Action, Agent, Context, CoordinatorError, Params, Result, StatusPublisher, Value};

struct AddAction;
#[async_trait]
impl Action for AddAction {
    fn name(&self) -> &str {
        "add"
    }
    async fn invoke(&self, _ctx: &Context, params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let x = params.get("x").and_then(Value::as_int).unwrap_or(0);
        let y = params.get("y").and_then(Value::as_int).unwrap_or(0);
        Ok(params([("sum", Value::Int(x + y))]))
    }
}

struct StringifyAction;
#[async_trait]
impl Action for StringifyAction {
    fn name(&self) -> &str {
        "stringify"
    }
    async fn invoke(&self, _ctx: &Context, params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let n = params.get("n").map(Value::to_string).unwrap_or_default();
        Ok(params([("text", Value::Str(n))]))
    }
}

struct RaisingAction;
#[async_trait]
impl Action for RaisingAction {
    fn name(&self) -> &str {
        "raise"
    }
    async fn invoke(&self, _ctx: &Context, _params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        Err(CoordinatorError::AgentFault {
            agent: "A".into(),
            action: "raise".into(),
            message: "synthetic failure".into(),
            cause: None,
        })
    }
}

/// Fails on the first N invocations then succeeds; used for retry tests.
pub struct FlakyAction {
    name: &'static str,
    failures_remaining: AtomicU32,
}

impl FlakyAction {
    #[must_use]
    pub fn new(name: &'static str, fail_times: u32) -> Self {
        Self {
            name,
            failures_remaining: AtomicU32::new(fail_times),
        }
    }
}

#[async_trait]
impl Action for FlakyAction {
    fn name(&self) -> &str {
        self.name
    }
    async fn invoke(&self, _ctx: &Context, params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(CoordinatorError::AgentFault {
                agent: "flaky".into(),
                action: self.name.into(),
                message: format!("transient failure, {remaining} remaining"),
                cause: None,
            });
        }
        Ok(params.clone())
    }
}

struct SleepAction {
    sleep: Duration,
}
#[async_trait]
impl Action for SleepAction {
    fn name(&self) -> &str {
        "sleep"
    }
    async fn invoke(&self, ctx: &Context, params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while waited < self.sleep {
            if ctx.is_cancelled() {
                return Err(CoordinatorError::Cancelled {
                    reason: "observed cancellation during sleep".into(),
                });
            }
            tokio::time::sleep(step).await;
            waited += step;
        }
        Ok(params.clone())
    }
}

struct PingAction;
#[async_trait]
impl Action for PingAction {
    fn name(&self) -> &str {
        "ping"
    }
    async fn invoke(&self, _ctx: &Context, _params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        Ok(params([("t", Value::Int(1))]))
    }
}

struct MergeAction;
#[async_trait]
impl Action for MergeAction {
    fn name(&self) -> &str {
        "merge"
    }
    async fn invoke(&self, _ctx: &Context, params: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let a = params.get("a").and_then(Value::as_int).unwrap_or(0);
        let b = params.get("b").and_then(Value::as_int).unwrap_or(0);
        Ok(params([("merged", Value::Int(a + b))]))
    }
}

macro_rules! single_action_agent {
    ($struct_name:ident, $agent_name:expr, $ctor:expr) => {
        pub struct $struct_name(Box<dyn Action>);
        impl $struct_name {
            #[must_use]
            pub fn new() -> Self {
                Self(Box::new($ctor))
            }
        }
        impl Agent for $struct_name {
            fn name(&self) -> &str {
                $agent_name
            }
            fn actions(&self) -> Vec<&dyn Action> {
                vec![self.0.as_ref()]
            }
        }
    };
}

/// Agent with both `add` and `stringify` — matches §8 scenario 1's agent A.
pub struct AgentA {
    add: AddAction,
    stringify: StringifyAction,
    raise: RaisingAction,
}
impl AgentA {
    #[must_use]
    pub fn new() -> Self {
        Self {
            add: AddAction,
            stringify: StringifyAction,
            raise: RaisingAction,
        }
    }
}
impl Agent for AgentA {
    fn name(&self) -> &str {
        "A"
    }
    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.add, &self.stringify, &self.raise]
    }
}

single_action_agent!(AgentB, "B", PingAction);
single_action_agent!(AgentC, "C", PingAction);
single_action_agent!(AgentD, "D", MergeAction);

pub struct SleepyAgent {
    action: SleepAction,
}
impl SleepyAgent {
    #[must_use]
    pub fn new(sleep: Duration) -> Self {
        Self {
            action: SleepAction { sleep },
        }
    }
}
impl Agent for SleepyAgent {
    fn name(&self) -> &str {
        "sleepy"
    }
    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.action]
    }
}

pub struct FlakyAgent {
    action: FlakyAction,
}
impl FlakyAgent {
    #[must_use]
    pub fn new(fail_times: u32) -> Self {
        Self {
            action: FlakyAction::new("flaky", fail_times),
        }
    }
}
impl Agent for FlakyAgent {
    fn name(&self) -> &str {
        "flaky"
    }
    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.action]
    }
}

#[must_use]
pub fn demo_agent() -> Arc<dyn Agent> {
    Arc::new(AgentA::new())
}

fn step(agent: &str, action: &str) -> WorkflowStep {
    WorkflowStep {
        agent: agent.to_string(),
        action: action.to_string(),
        params: Params::new(),
        bindings: vec![],
        timeout_ms: None,
        group: None,
    }
}

/// §8 scenario 1: happy path, two sequential steps.
#[must_use]
pub fn happy_path_two_steps() -> WorkflowDefinition {
    let mut s0 = step("A", "add");
    s0.params = params([("x", Value::Int(2)), ("y", Value::Int(3))]);
    let mut s1 = step("A", "stringify");
    s1.bindings.push(Binding {
        param: "n".into(),
        from_step: 0,
        from_field: "sum".into(),
    });
    WorkflowDefinition {
        steps: vec![s0, s1],
        workflow_timeout_ms: None,
        on_step_failure: OnStepFailure::default(),
    }
}

#[must_use]
pub fn single_ok_step() -> WorkflowDefinition {
    let mut s0 = step("A", "add");
    s0.params = params([("x", Value::Int(1)), ("y", Value::Int(1))]);
    WorkflowDefinition {
        steps: vec![s0],
        workflow_timeout_ms: None,
        on_step_failure: OnStepFailure::default(),
    }
}

/// §8 scenario 2: abort on failure, three steps.
#[must_use]
pub fn abort_on_failure_three_steps() -> WorkflowDefinition {
    WorkflowDefinition {
        steps: vec![step("A", "add"), step("A", "raise"), step("A", "stringify")],
        workflow_timeout_ms: None,
        on_step_failure: OnStepFailure::Simple(SimplePolicy::Abort),
    }
}

/// §8 scenario 4: parallel group of two feeding a merge step.
#[must_use]
pub fn parallel_group_workflow() -> WorkflowDefinition {
    let mut s0 = step("B", "ping");
    s0.group = Some("g1".into());
    let mut s1 = step("C", "ping");
    s1.group = Some("g1".into());
    let mut s2 = step("D", "merge");
    s2.bindings.push(Binding {
        param: "a".into(),
        from_step: 0,
        from_field: "t".into(),
    });
    s2.bindings.push(Binding {
        param: "b".into(),
        from_step: 1,
        from_field: "t".into(),
    });
    WorkflowDefinition {
        steps: vec![s0, s1, s2],
        workflow_timeout_ms: None,
        on_step_failure: OnStepFailure::default(),
    }
}

/// §8 scenario 6: retry recovers a transient failure.
#[must_use]
pub fn retry_recovers_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        steps: vec![step("flaky", "flaky")],
        workflow_timeout_ms: None,
        on_step_failure: OnStepFailure::Retry {
            retry: RetryPolicy {
                max_attempts: 2,
                backoff_ms: 10,
                exponential: false,
            },
        },
    }
}
