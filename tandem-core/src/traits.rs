//! ABOUTME: Agent and Action traits — the capabilities the registry holds and the runtime invokes
//! ABOUTME: Agents receive only a narrow status-publishing capability, never a handle to the coordinator

use crate::context::Context;
use crate::error::Result;
use crate::value::Params;
use async_trait::async_trait;
use std::fmt::Debug;

/// Narrow capability an agent may use to publish progress of its own
/// invocation. Agents never hold a back-pointer to the executor or the
/// registry (§9 Design Notes) — this is the only channel offered to them,
/// and it is entirely optional to use.
#[async_trait]
pub trait StatusPublisher: Send + Sync + Debug {
    /// Emit a free-form progress note, correlated by the runtime with the
    /// current workflow/step. Fire-and-forget: failures are logged, never
    /// propagated to the agent.
    async fn note(&self, message: &str);
}

/// A no-op publisher for agents/tests that don't care about progress
/// reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusPublisher;

#[async_trait]
impl StatusPublisher for NullStatusPublisher {
    async fn note(&self, _message: &str) {}
}

/// A single named capability exposed by an agent.
///
/// `Action` is a pure descriptor plus an invocation entry point.
/// Implementations are not required to validate parameters beyond what
/// they consume (§3) — unused keys are simply ignored.
#[async_trait]
pub trait Action: Send + Sync {
    /// Name unique within the owning agent.
    fn name(&self) -> &str;

    /// Invoke this action. `ctx` carries the effective per-call deadline
    /// and cancellation signal (§4.3); long-running implementations must
    /// poll `ctx.is_cancelled()` at natural yield points.
    ///
    /// Returning `Err` here is surfaced to the runtime as a recoverable
    /// domain failure (`ErrorKind::AgentFault`); panicking inside this
    /// method is also caught and converted to `AgentFault` by the runtime,
    /// but implementations should prefer returning `Err`.
    async fn invoke(
        &self,
        ctx: &Context,
        params: &Params,
        status: &dyn StatusPublisher,
    ) -> Result<Params>;
}

/// A registered worker exposing one or more named actions (§3).
///
/// Agents are created by the host application at startup and registered
/// once; the registry holds the sole strong reference to each one for the
/// life of the process.
pub trait Agent: Send + Sync {
    /// Non-empty, case-sensitive, unique within the registry.
    fn name(&self) -> &str;

    /// The actions this agent exposes. Must be non-empty: an agent with
    /// zero actions is rejected at registration (§4.2).
    fn actions(&self) -> Vec<&dyn Action>;

    fn action(&self, name: &str) -> Option<&dyn Action> {
        self.actions().into_iter().find(|a| a.name() == name)
    }

    /// Run once, in registration order, before the registry is sealed for
    /// concurrent lookups. A failure aborts startup (§4.2).
    fn on_start(&self) -> Result<()> {
        Ok(())
    }

    /// Run once, in reverse registration order, during shutdown or startup
    /// rollback.
    fn on_stop(&self) -> Result<()> {
        Ok(())
    }
}
