//! ABOUTME: Workflow Executor — drives a WorkflowDefinition's steps to a terminal WorkflowResult (spec §4.4)
//! ABOUTME: Sequential by default, parallel within a named group, retry/abort/continue per on_step_failure

use crate::definition::{OnStepFailure, RetryPolicy, WorkflowDefinition, WorkflowStep};
use crate::diagnostics::{Diagnostics, DiagnosticsSnapshot};
use crate::model::{ErrorInfo, StepResult, StepStatus, WorkflowResult, WorkflowStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tandem_agents::{AgentRuntime, InvocationOutcome, Registry};
use tandem_core::{Context, CoordinatorError, ErrorKind, NullStatusPublisher, Params, Result, SharedClock};
use tandem_events::{EventBus, StatusEvent, StepOutcomeSummary, WorkflowOutcomeSummary};
use tracing::{error, info_span, instrument, Instrument};

pub struct WorkflowExecutor {
    registry: Arc<Registry>,
    runtime: Arc<AgentRuntime>,
    bus: Arc<EventBus>,
    clock: SharedClock,
    default_step_timeout: Duration,
    diagnostics: Arc<Diagnostics>,
}

impl WorkflowExecutor {
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        runtime: Arc<AgentRuntime>,
        bus: Arc<EventBus>,
        clock: SharedClock,
        default_step_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            runtime,
            bus,
            clock,
            default_step_timeout,
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    #[must_use]
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot(self.bus.events_dropped_total())
    }

    #[must_use]
    pub fn active_workflow_ids(&self) -> Vec<String> {
        self.diagnostics.active_workflow_ids()
    }

    /// Drive `def` to completion. `ConfigError`/`UnknownAgent`/`UnknownAction`
    /// are returned here, before a `workflow_id` exists (§7 propagation
    /// policy); every other failure is folded into a `StepResult` and the
    /// call still returns `Ok(WorkflowResult)`.
    pub async fn run(&self, def: &WorkflowDefinition, caller_ctx: Context) -> Result<WorkflowResult> {
        def.validate()?;
        for step in &def.steps {
            self.registry.lookup_action(&step.agent, &step.action)?;
        }

        let workflow_id = uuid::Uuid::new_v4().to_string();
        let t0 = self.clock.now();
        let wall_started = Utc::now();
        let mut workflow_ctx = caller_ctx.child(Some(workflow_id.clone()));
        if let Some(wt) = def.workflow_timeout_ms {
            workflow_ctx = workflow_ctx.child_with_timeout(Duration::from_millis(wt));
        }

        self.bus.publish(StatusEvent::WorkflowStarted {
            workflow_id: workflow_id.clone(),
            at: wall_started,
        });
        self.diagnostics.on_workflow_started(&workflow_id);

        let span = info_span!("workflow", workflow_id = %workflow_id);
        let results = self.run_steps(def, &workflow_ctx, &workflow_id).instrument(span).await;

        let finished = self.clock.now();
        let wall_finished = Utc::now();
        let overall = Self::overall_status(&results, &def.on_step_failure);

        self.bus.publish(StatusEvent::WorkflowFinished {
            workflow_id: workflow_id.clone(),
            status: Self::summarize_workflow(overall),
            at: wall_finished,
        });
        self.diagnostics.on_workflow_finished(&workflow_id, overall);

        Ok(WorkflowResult {
            workflow_id,
            status: overall,
            started_at: wall_started,
            finished_at: wall_finished,
            duration_ms: Self::ms(t0, finished),
            steps: results,
        })
    }

    async fn run_steps(&self, def: &WorkflowDefinition, workflow_ctx: &Context, workflow_id: &str) -> Vec<StepResult> {
        let n = def.steps.len();
        let mut results: Vec<StepResult> = Vec::with_capacity(n);
        let mut aborted = false;

        for unit in Self::plan_units(&def.steps) {
            if aborted || workflow_ctx.is_cancelled() {
                break;
            }

            if unit.len() == 1 {
                let idx = unit[0];
                let result = self
                    .execute_step(&def.steps[idx], idx, workflow_ctx, workflow_id, &results, &def.on_step_failure)
                    .await;
                if result.status != StepStatus::Ok && def.on_step_failure.is_abort() {
                    aborted = true;
                }
                results.push(result);
            } else {
                let futures = unit.iter().map(|&idx| {
                    self.execute_step(&def.steps[idx], idx, workflow_ctx, workflow_id, &results, &def.on_step_failure)
                });
                let group_results = futures::future::join_all(futures).await;
                if def.on_step_failure.is_abort() && group_results.iter().any(|r| r.status != StepStatus::Ok) {
                    aborted = true;
                }
                results.extend(group_results);
            }
        }

        let fill_status = if workflow_ctx.is_cancelled() {
            StepStatus::Cancelled
        } else {
            StepStatus::Skipped
        };
        for idx in results.len()..n {
            results.push(Self::synthetic_result(&def.steps[idx], idx, fill_status, Utc::now()));
        }

        results
    }

    #[instrument(skip_all, fields(step = idx, agent = %step.agent, action = %step.action))]
    async fn execute_step(
        &self,
        step: &WorkflowStep,
        idx: usize,
        workflow_ctx: &Context,
        workflow_id: &str,
        prior: &[StepResult],
        policy: &OnStepFailure,
    ) -> StepResult {
        let started = self.clock.now();
        let wall_started = Utc::now();
        self.bus.publish(StatusEvent::StepStarted {
            workflow_id: workflow_id.to_string(),
            step_index: idx,
            agent: step.agent.clone(),
            action: step.action.clone(),
            at: wall_started,
        });

        let params = match Self::resolve_bindings(step, prior) {
            Ok(p) => p,
            Err(e) => {
                let finished = self.clock.now();
                let wall_finished = Utc::now();
                let result = StepResult {
                    index: idx,
                    agent: step.agent.clone(),
                    action: step.action.clone(),
                    status: StepStatus::Failed,
                    output: None,
                    error: Some(ErrorInfo::from(&e)),
                    started_at: wall_started,
                    finished_at: wall_finished,
                    duration_ms: Self::ms(started, finished),
                    attempts: None,
                };
                self.diagnostics.on_failure(ErrorKind::DataflowError);
                self.bus.publish(StatusEvent::StepFinished {
                    workflow_id: workflow_id.to_string(),
                    step_index: idx,
                    status: StepOutcomeSummary::Failed(ErrorKind::DataflowError),
                    at: wall_finished,
                });
                return result;
            }
        };

        let agent = self
            .registry
            .lookup(&step.agent)
            .expect("agent existence validated at submission");
        let step_timeout = step.timeout_ms.map(Duration::from_millis).unwrap_or(self.default_step_timeout);
        let retry = policy.retry_policy();
        let max_attempts = retry.map_or(1, |r| r.max_attempts);

        let mut causes = Vec::new();
        let mut attempts_used = 0u32;
        let mut outcome;
        loop {
            attempts_used += 1;
            let step_ctx = workflow_ctx.child_with_timeout(step_timeout);
            self.diagnostics.on_invocation(&step.agent);
            outcome = self
                .runtime
                .invoke(&step_ctx, Arc::clone(&agent), &step.action, params.clone(), Arc::new(NullStatusPublisher))
                .await;

            if attempt_is_retryable(&outcome) && attempts_used < max_attempts && !workflow_ctx.is_expired() {
                causes.push(format!("attempt {attempts_used}: {}", describe_outcome(&outcome)));
                if let Some(r) = retry {
                    tokio::time::sleep(backoff_for(r, attempts_used)).await;
                }
                continue;
            }
            break;
        }

        let finished = self.clock.now();
        let wall_finished = Utc::now();
        let (status, output, error) = match outcome {
            InvocationOutcome::Ok(out) => (StepStatus::Ok, Some(out), None),
            InvocationOutcome::Failed(e) => {
                let kind = e.kind();
                self.diagnostics.on_failure(kind);
                if kind == ErrorKind::Internal {
                    error!(
                        workflow_id = %workflow_id,
                        step = idx,
                        cause_chain = ?e,
                        "internal coordinator error"
                    );
                }
                (
                    StepStatus::Failed,
                    None,
                    Some(ErrorInfo {
                        kind,
                        message: e.to_string(),
                        causes: causes.clone(),
                    }),
                )
            }
            InvocationOutcome::Timeout => {
                self.diagnostics.on_failure(ErrorKind::Timeout);
                (
                    StepStatus::Timeout,
                    None,
                    Some(ErrorInfo {
                        kind: ErrorKind::Timeout,
                        message: format!("deadline of {}ms exceeded", step_timeout.as_millis()),
                        causes: causes.clone(),
                    }),
                )
            }
            InvocationOutcome::Cancelled => {
                self.diagnostics.on_failure(ErrorKind::Cancelled);
                (
                    StepStatus::Cancelled,
                    None,
                    Some(ErrorInfo {
                        kind: ErrorKind::Cancelled,
                        message: "parent context was cancelled".to_string(),
                        causes: causes.clone(),
                    }),
                )
            }
        };

        self.bus.publish(StatusEvent::StepFinished {
            workflow_id: workflow_id.to_string(),
            step_index: idx,
            status: Self::summarize_step(status, error.as_ref()),
            at: wall_finished,
        });

        StepResult {
            index: idx,
            agent: step.agent.clone(),
            action: step.action.clone(),
            status,
            output,
            error,
            started_at: wall_started,
            finished_at: wall_finished,
            duration_ms: Self::ms(started, finished),
            attempts: retry.map(|_| attempts_used),
        }
    }

    fn resolve_bindings(step: &WorkflowStep, prior: &[StepResult]) -> std::result::Result<Params, CoordinatorError> {
        let mut resolved: Params = step.params.clone();
        for binding in &step.bindings {
            let source = prior.get(binding.from_step).ok_or_else(|| CoordinatorError::Dataflow {
                step_index: binding.from_step,
                message: format!("source step {} has not produced a result yet", binding.from_step),
            })?;
            if source.status != StepStatus::Ok {
                return Err(CoordinatorError::Dataflow {
                    step_index: binding.from_step,
                    message: format!("source step {} did not complete ok (status {:?})", binding.from_step, source.status),
                });
            }
            let output = source.output.as_ref().ok_or_else(|| CoordinatorError::Dataflow {
                step_index: binding.from_step,
                message: format!("source step {} produced no output", binding.from_step),
            })?;
            let value = output.get(&binding.from_field).cloned().ok_or_else(|| CoordinatorError::Dataflow {
                step_index: binding.from_step,
                message: format!("source step {} has no field '{}'", binding.from_step, binding.from_field),
            })?;
            resolved.insert(binding.param.clone(), value);
        }
        Ok(resolved)
    }

    /// Partition steps into execution units: a lone step, or a run of
    /// consecutive steps sharing the same `group` label (§4.4).
    fn plan_units(steps: &[WorkflowStep]) -> Vec<Vec<usize>> {
        let mut units = Vec::new();
        let mut i = 0;
        while i < steps.len() {
            match steps[i].group.as_deref() {
                None => {
                    units.push(vec![i]);
                    i += 1;
                }
                Some(label) => {
                    let mut j = i + 1;
                    while j < steps.len() && steps[j].group.as_deref() == Some(label) {
                        j += 1;
                    }
                    units.push((i..j).collect());
                    i = j;
                }
            }
        }
        units
    }

    fn synthetic_result(step: &WorkflowStep, idx: usize, status: StepStatus, at: DateTime<Utc>) -> StepResult {
        let error = match status {
            StepStatus::Cancelled => Some(ErrorInfo {
                kind: ErrorKind::Cancelled,
                message: "parent context was cancelled before this step could start".to_string(),
                causes: Vec::new(),
            }),
            _ => None,
        };
        StepResult {
            index: idx,
            agent: step.agent.clone(),
            action: step.action.clone(),
            status,
            output: None,
            error,
            started_at: at,
            finished_at: at,
            duration_ms: 0,
            attempts: None,
        }
    }

    /// §4.4: under `abort`/`abort_all`, the workflow's status mirrors the
    /// first non-ok step's own terminal status. Under `continue`, the rule
    /// is binary — failed iff any step is non-ok, else ok — so a timed-out
    /// or cancelled step does not leak its specific status to the
    /// workflow when the policy let the run carry on past it.
    fn overall_status(results: &[StepResult], policy: &OnStepFailure) -> WorkflowStatus {
        let any_nonskipped_bad = results
            .iter()
            .any(|r| !matches!(r.status, StepStatus::Ok | StepStatus::Skipped));
        let any_skipped = results.iter().any(|r| r.status == StepStatus::Skipped);

        if policy.is_continue() {
            return if any_nonskipped_bad || any_skipped {
                WorkflowStatus::Failed
            } else {
                WorkflowStatus::Ok
            };
        }

        if let Some(first_bad) = results.iter().find(|r| !matches!(r.status, StepStatus::Ok | StepStatus::Skipped)) {
            return match first_bad.status {
                StepStatus::Failed => WorkflowStatus::Failed,
                StepStatus::Timeout => WorkflowStatus::Timeout,
                StepStatus::Cancelled => WorkflowStatus::Cancelled,
                StepStatus::Ok | StepStatus::Skipped => unreachable!(),
            };
        }
        if any_skipped {
            return WorkflowStatus::Failed;
        }
        WorkflowStatus::Ok
    }

    fn summarize_step(status: StepStatus, error: Option<&ErrorInfo>) -> StepOutcomeSummary {
        match status {
            StepStatus::Ok => StepOutcomeSummary::Ok,
            StepStatus::Failed => StepOutcomeSummary::Failed(error.map_or(ErrorKind::Internal, |e| e.kind)),
            StepStatus::Timeout => StepOutcomeSummary::Timeout,
            StepStatus::Cancelled => StepOutcomeSummary::Cancelled,
            StepStatus::Skipped => StepOutcomeSummary::Skipped,
        }
    }

    fn summarize_workflow(status: WorkflowStatus) -> WorkflowOutcomeSummary {
        match status {
            WorkflowStatus::Ok => WorkflowOutcomeSummary::Ok,
            WorkflowStatus::Failed => WorkflowOutcomeSummary::Failed,
            WorkflowStatus::Timeout => WorkflowOutcomeSummary::Timeout,
            WorkflowStatus::Cancelled => WorkflowOutcomeSummary::Cancelled,
        }
    }

    fn ms(from: Instant, to: Instant) -> u64 {
        to.saturating_duration_since(from).as_millis() as u64
    }
}

fn attempt_is_retryable(outcome: &InvocationOutcome) -> bool {
    matches!(outcome, InvocationOutcome::Timeout) || matches!(outcome, InvocationOutcome::Failed(e) if e.kind() == ErrorKind::AgentFault)
}

fn describe_outcome(outcome: &InvocationOutcome) -> String {
    match outcome {
        InvocationOutcome::Ok(_) => "ok".to_string(),
        InvocationOutcome::Failed(e) => format!("{}: {e}", e.kind()),
        InvocationOutcome::Timeout => "timeout".to_string(),
        InvocationOutcome::Cancelled => "cancelled".to_string(),
    }
}

fn backoff_for(retry: &RetryPolicy, attempts_used: u32) -> Duration {
    if retry.exponential {
        let factor = 1u64.checked_shl(attempts_used.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_millis(retry.backoff_ms.saturating_mul(factor))
    } else {
        Duration::from_millis(retry.backoff_ms)
    }
}
