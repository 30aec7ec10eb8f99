//! ABOUTME: Agent Runtime — invokes one (agent, action, parameters) tuple with bounded latency (spec §4.3)
//! ABOUTME: No retries here (workflow-level concern); panics/timeouts/cancellation never escape as exceptions

use std::sync::Arc;
use std::time::Duration;
use tandem_core::{Action, Agent, Context, CoordinatorError, Params, StatusPublisher, Value};
use tracing::{debug, warn};

/// Terminal outcome of a single invocation, before the workflow executor
/// wraps it into a `StepResult` with timestamps and a step index.
#[derive(Debug)]
pub enum InvocationOutcome {
    Ok(Params),
    Failed(CoordinatorError),
    Timeout,
    Cancelled,
}

/// Default bound the runtime enforces on serialized agent output, per the
/// §9 Open Question recommendation ("implementations may enforce an upper
/// bound... and fail with `AgentFault` if exceeded; make the bound
/// configurable").
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Default grace period the runtime waits for a cancelled/timed-out agent
/// to cooperate before abandoning it (§5, bounded 0..=5s by the caller).
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(250);

pub struct AgentRuntime {
    grace_period: Duration,
    max_output_bytes: usize,
}

impl AgentRuntime {
    #[must_use]
    pub fn new(grace_period: Duration, max_output_bytes: usize) -> Self {
        Self {
            grace_period: grace_period.min(Duration::from_secs(5)),
            max_output_bytes,
        }
    }

    /// Invoke `action_name` on `agent`. `ctx` must already carry the
    /// effective per-call deadline (`min(step deadline, remaining workflow
    /// deadline)`, per §4.3) — the runtime does not compute it.
    pub async fn invoke(
        &self,
        ctx: &Context,
        agent: Arc<dyn Agent>,
        action_name: &str,
        params: Params,
        status: Arc<dyn StatusPublisher>,
    ) -> InvocationOutcome {
        if ctx.is_cancelled() {
            debug!(agent = agent.name(), action_name, "short-circuit: already cancelled");
            return InvocationOutcome::Cancelled;
        }
        if ctx.is_expired() {
            debug!(agent = agent.name(), action_name, "short-circuit: deadline already elapsed");
            return InvocationOutcome::Timeout;
        }

        let action_name_owned = action_name.to_string();
        let agent_name_owned = agent.name().to_string();
        let invoke_ctx = ctx.clone();
        let mut handle = tokio::spawn(async move {
            let action: &dyn Action = agent
                .action(&action_name_owned)
                .expect("action existence validated at submission time");
            action.invoke(&invoke_ctx, &params, status.as_ref()).await
        });

        let remaining = ctx.remaining();
        let cancellation = ctx.cancellation_token();
        let outcome = if let Some(remaining) = remaining {
            tokio::select! {
                biased;
                res = &mut handle => Self::classify(res, &agent_name_owned, action_name),
                () = cancellation.cancelled() => {
                    self.abandon(handle, InvocationOutcome::Cancelled).await
                }
                () = tokio::time::sleep(remaining) => {
                    ctx.cancel();
                    self.abandon(handle, InvocationOutcome::Timeout).await
                }
            }
        } else {
            tokio::select! {
                biased;
                res = &mut handle => Self::classify(res, &agent_name_owned, action_name),
                () = cancellation.cancelled() => {
                    self.abandon(handle, InvocationOutcome::Cancelled).await
                }
            }
        };

        self.enforce_output_bound(outcome)
    }

    /// Wait up to the grace period for an already-deadline'd invocation to
    /// cooperate, then report the terminal status regardless of whether it
    /// did. The spawned task is never forcibly aborted: if it eventually
    /// finishes after we've moved on, its result is simply discarded.
    async fn abandon(
        &self,
        handle: tokio::task::JoinHandle<tandem_core::Result<Params>>,
        terminal: InvocationOutcome,
    ) -> InvocationOutcome {
        match tokio::time::timeout(self.grace_period, handle).await {
            Ok(_) => debug!("agent cooperated with cancellation within grace period"),
            Err(_) => warn!("agent did not cooperate within grace period; abandoning invocation"),
        }
        terminal
    }

    fn classify(
        res: Result<tandem_core::Result<Params>, tokio::task::JoinError>,
        agent: &str,
        action: &str,
    ) -> InvocationOutcome {
        match res {
            Ok(Ok(params)) => InvocationOutcome::Ok(params),
            Ok(Err(e)) => InvocationOutcome::Failed(e),
            Err(join_err) if join_err.is_panic() => {
                InvocationOutcome::Failed(CoordinatorError::AgentFault {
                    agent: agent.to_string(),
                    action: action.to_string(),
                    message: "agent action panicked".to_string(),
                    cause: None,
                })
            }
            Err(_) => InvocationOutcome::Failed(CoordinatorError::internal(
                "invocation task ended without completing or panicking",
            )),
        }
    }

    fn enforce_output_bound(&self, outcome: InvocationOutcome) -> InvocationOutcome {
        if let InvocationOutcome::Ok(ref params) = outcome {
            let size = Value::Map(params.clone()).approx_size();
            if size > self.max_output_bytes {
                return InvocationOutcome::Failed(CoordinatorError::AgentFault {
                    agent: String::new(),
                    action: String::new(),
                    message: format!(
                        "output size {size} bytes exceeds bound of {} bytes",
                        self.max_output_bytes
                    ),
                    cause: None,
                });
            }
        }
        outcome
    }
}

impl Default for AgentRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD, DEFAULT_MAX_OUTPUT_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tandem_core::{clock::FakeClock, params, NullStatusPublisher, SharedClock};

    struct SleepyAction {
        sleep: Duration,
    }
    #[async_trait]
    impl Action for SleepyAction {
        fn name(&self) -> &str {
            "sleepy"
        }
        async fn invoke(
            &self,
            ctx: &Context,
            params: &Params,
            _status: &dyn StatusPublisher,
        ) -> tandem_core::Result<Params> {
            let mut waited = Duration::ZERO;
            let step = Duration::from_millis(5);
            while waited < self.sleep {
                if ctx.is_cancelled() {
                    return Err(CoordinatorError::Cancelled {
                        reason: "cooperative agent observed cancellation".into(),
                    });
                }
                tokio::time::sleep(step).await;
                waited += step;
            }
            Ok(params.clone())
        }
    }

    struct PanicAction;
    #[async_trait]
    impl Action for PanicAction {
        fn name(&self) -> &str {
            "boom"
        }
        async fn invoke(
            &self,
            _ctx: &Context,
            _params: &Params,
            _status: &dyn StatusPublisher,
        ) -> tandem_core::Result<Params> {
            panic!("agent blew up");
        }
    }

    struct OneAction<A: Action>(A);
    impl<A: Action> Agent for OneAction<A> {
        fn name(&self) -> &str {
            "agent"
        }
        fn actions(&self) -> Vec<&dyn Action> {
            vec![&self.0]
        }
    }

    #[tokio::test]
    async fn successful_invocation_returns_ok() {
        let runtime = AgentRuntime::default();
        let clock: SharedClock = Arc::new(FakeClock::new());
        let ctx = Context::new(clock).with_timeout(Duration::from_secs(1));
        let agent: Arc<dyn Agent> = Arc::new(OneAction(SleepyAction {
            sleep: Duration::ZERO,
        }));
        let out = runtime
            .invoke(&ctx, agent, "sleepy", params([("x", Value::Int(1))]), Arc::new(NullStatusPublisher))
            .await;
        assert!(matches!(out, InvocationOutcome::Ok(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cooperative_timeout_reports_timeout() {
        let runtime = AgentRuntime::new(Duration::from_millis(50), DEFAULT_MAX_OUTPUT_BYTES);
        let clock: SharedClock = tandem_core::system_clock();
        let ctx = Context::new(clock).with_timeout(Duration::from_millis(20));
        let agent: Arc<dyn Agent> = Arc::new(OneAction(SleepyAction {
            sleep: Duration::from_millis(500),
        }));
        let out = runtime
            .invoke(&ctx, agent, "sleepy", Params::new(), Arc::new(NullStatusPublisher))
            .await;
        assert!(matches!(out, InvocationOutcome::Timeout));
    }

    #[tokio::test]
    async fn panic_is_converted_to_agent_fault() {
        let runtime = AgentRuntime::default();
        let clock: SharedClock = Arc::new(FakeClock::new());
        let ctx = Context::new(clock).with_timeout(Duration::from_secs(1));
        let agent: Arc<dyn Agent> = Arc::new(OneAction(PanicAction));
        let out = runtime
            .invoke(&ctx, agent, "boom", Params::new(), Arc::new(NullStatusPublisher))
            .await;
        match out {
            InvocationOutcome::Failed(e) => assert_eq!(e.kind(), tandem_core::ErrorKind::AgentFault),
            other => panic!("expected Failed(AgentFault), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn already_expired_deadline_short_circuits_without_invoking() {
        let runtime = AgentRuntime::default();
        let clock = FakeClock::new();
        let shared: SharedClock = Arc::new(clock.clone());
        let ctx = Context::new(shared).with_timeout(Duration::from_millis(10));
        clock.advance(Duration::from_millis(50));
        let agent: Arc<dyn Agent> = Arc::new(OneAction(SleepyAction {
            sleep: Duration::from_millis(500),
        }));
        let out = runtime
            .invoke(&ctx, agent, "sleepy", Params::new(), Arc::new(NullStatusPublisher))
            .await;
        assert!(matches!(out, InvocationOutcome::Timeout));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let runtime = AgentRuntime::default();
        let clock: SharedClock = Arc::new(FakeClock::new());
        let ctx = Context::new(clock);
        ctx.cancel();
        let agent: Arc<dyn Agent> = Arc::new(OneAction(SleepyAction {
            sleep: Duration::from_millis(500),
        }));
        let out = runtime
            .invoke(&ctx, agent, "sleepy", Params::new(), Arc::new(NullStatusPublisher))
            .await;
        assert!(matches!(out, InvocationOutcome::Cancelled));
    }
}
