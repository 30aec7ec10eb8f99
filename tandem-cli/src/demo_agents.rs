//! ABOUTME: Built-in agents matching the worked examples of spec §8, registered at startup
//! ABOUTME: `coord` has no plugin-loading mechanism; these are the only agents it can invoke

use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{params, Action, Agent, Context, CoordinatorError, Params, Result, StatusPublisher, Value};

struct AddAction;
#[async_trait]
impl Action for AddAction {
    fn name(&self) -> &str {
        "add"
    }
    async fn invoke(&self, _ctx: &Context, p: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let x = p.get("x").and_then(Value::as_int).unwrap_or(0);
        let y = p.get("y").and_then(Value::as_int).unwrap_or(0);
        Ok(params([("sum", Value::Int(x + y))]))
    }
}

struct StringifyAction;
#[async_trait]
impl Action for StringifyAction {
    fn name(&self) -> &str {
        "stringify"
    }
    async fn invoke(&self, _ctx: &Context, p: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let n = p.get("n").map(Value::to_string).unwrap_or_default();
        Ok(params([("text", Value::Str(n))]))
    }
}

struct RaiseAction;
#[async_trait]
impl Action for RaiseAction {
    fn name(&self) -> &str {
        "raise"
    }
    async fn invoke(&self, _ctx: &Context, _p: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        Err(CoordinatorError::AgentFault {
            agent: "A".into(),
            action: "raise".into(),
            message: "demo agent A.raise always fails".into(),
            cause: None,
        })
    }
}

/// Agent `A`: `add(x, y) -> {sum}`, `stringify(n) -> {text}`, `raise` (always fails, for demos).
struct AgentA {
    add: AddAction,
    stringify: StringifyAction,
    raise: RaiseAction,
}
impl Agent for AgentA {
    fn name(&self) -> &str {
        "A"
    }
    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.add, &self.stringify, &self.raise]
    }
}

struct PingAction;
#[async_trait]
impl Action for PingAction {
    fn name(&self) -> &str {
        "ping"
    }
    async fn invoke(&self, _ctx: &Context, _p: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        Ok(params([("t", Value::Int(1))]))
    }
}

/// Agents `B`/`C`: single `ping -> {t: 1}` action, used in the parallel-group demo.
struct PingAgent {
    id: &'static str,
    action: PingAction,
}
impl Agent for PingAgent {
    fn name(&self) -> &str {
        self.id
    }
    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.action]
    }
}

struct MergeAction;
#[async_trait]
impl Action for MergeAction {
    fn name(&self) -> &str {
        "merge"
    }
    async fn invoke(&self, _ctx: &Context, p: &Params, _status: &dyn StatusPublisher) -> Result<Params> {
        let a = p.get("a").and_then(Value::as_int).unwrap_or(0);
        let b = p.get("b").and_then(Value::as_int).unwrap_or(0);
        Ok(params([("merged", Value::Int(a + b))]))
    }
}

/// Agent `D`: `merge(a, b) -> {merged}`, the sink of the parallel-group demo.
struct MergeAgent {
    action: MergeAction,
}
impl Agent for MergeAgent {
    fn name(&self) -> &str {
        "D"
    }
    fn actions(&self) -> Vec<&dyn Action> {
        vec![&self.action]
    }
}

/// The full built-in set, ready to hand to `Registry::register`.
#[must_use]
pub fn all() -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(AgentA {
            add: AddAction,
            stringify: StringifyAction,
            raise: RaiseAction,
        }),
        Arc::new(PingAgent {
            id: "B",
            action: PingAction,
        }),
        Arc::new(PingAgent {
            id: "C",
            action: PingAction,
        }),
        Arc::new(MergeAgent { action: MergeAction }),
    ]
}
