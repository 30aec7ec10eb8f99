//! ABOUTME: Coordinator::diagnostics() counters (spec §6, supplemented per §C of SPEC_FULL.md)
//! ABOUTME: All counters are plain atomics; reading them never blocks a running workflow

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tandem_core::ErrorKind;

use crate::model::WorkflowStatus;

/// Snapshot returned by `Coordinator::diagnostics()`. The four fields named
/// in §6 are `events_dropped_total`, `workflows_started_total`,
/// `workflows_terminal_total_by_status`, and `active_workflows`; the rest
/// are additive enrichments grounded on the teacher's monitoring crate
/// (see DESIGN.md) and do not change the §6 contract's minimum shape.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    pub events_dropped_total: u64,
    pub workflows_started_total: u64,
    pub workflows_terminal_total_by_status: HashMap<WorkflowStatus, u64>,
    pub active_workflows: u64,
    pub invocations_by_agent: HashMap<String, u64>,
    pub failures_by_kind: HashMap<ErrorKind, u64>,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    workflows_started_total: AtomicU64,
    active_workflows: DashMap<String, ()>,
    terminal_by_status: DashMap<WorkflowStatus, AtomicU64>,
    invocations_by_agent: DashMap<String, AtomicU64>,
    failures_by_kind: DashMap<ErrorKind, AtomicU64>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_workflow_started(&self, workflow_id: &str) {
        self.workflows_started_total.fetch_add(1, Ordering::Relaxed);
        self.active_workflows.insert(workflow_id.to_string(), ());
    }

    pub fn on_workflow_finished(&self, workflow_id: &str, status: WorkflowStatus) {
        self.active_workflows.remove(workflow_id);
        self.terminal_by_status
            .entry(status)
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_invocation(&self, agent: &str) {
        self.invocations_by_agent
            .entry(agent.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_failure(&self, kind: ErrorKind) {
        self.failures_by_kind.entry(kind).or_default().fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn active_workflow_ids(&self) -> Vec<String> {
        self.active_workflows.iter().map(|e| e.key().clone()).collect()
    }

    #[must_use]
    pub fn snapshot(&self, events_dropped_total: u64) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            events_dropped_total,
            workflows_started_total: self.workflows_started_total.load(Ordering::Relaxed),
            workflows_terminal_total_by_status: self
                .terminal_by_status
                .iter()
                .map(|e| (*e.key(), e.value().load(Ordering::Relaxed)))
                .collect(),
            active_workflows: self.active_workflows.len() as u64,
            invocations_by_agent: self
                .invocations_by_agent
                .iter()
                .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
                .collect(),
            failures_by_kind: self
                .failures_by_kind
                .iter()
                .map(|e| (*e.key(), e.value().load(Ordering::Relaxed)))
                .collect(),
        }
    }
}
