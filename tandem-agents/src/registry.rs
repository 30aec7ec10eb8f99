//! ABOUTME: Agent Registry — name → Agent, (agent, action) → Action lookups (spec §4.2)
//! ABOUTME: Read-mostly after start_all(); mutation is forbidden once any workflow has been submitted

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_core::{Agent, CoordinatorError, Result};
use tracing::{error, info, warn};

struct Inner {
    order: Vec<String>,
    agents: HashMap<String, Arc<dyn Agent>>,
    sealed: bool,
}

/// Holds the set of registered agents and the actions each exposes.
///
/// `register` is only legal before `start_all` (or, more precisely, before
/// the registry has been sealed — see [`Registry::seal`]). After that
/// point the registry is read-only, so `lookup`/`lookup_action` take only
/// a short read lock and never contend with a writer (§4.2 concurrency).
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                order: Vec::new(),
                agents: HashMap::new(),
                sealed: false,
            }),
        }
    }

    /// Register an agent. Fails with `ConfigError` if: the name is empty,
    /// the agent declares zero actions, the registry is already sealed, or
    /// the name collides with an existing registration and `replace` is
    /// false.
    pub fn register(&self, agent: Arc<dyn Agent>, replace: bool) -> Result<()> {
        let name = agent.name();
        if name.is_empty() {
            return Err(CoordinatorError::config("agent name must not be empty"));
        }
        if agent.actions().is_empty() {
            return Err(CoordinatorError::config(format!(
                "agent '{name}' declares zero actions"
            )));
        }

        let mut inner = self.inner.write();
        if inner.sealed {
            return Err(CoordinatorError::config(
                "registry is sealed: mutation after start_all/submission is forbidden",
            ));
        }
        let existing = inner.agents.contains_key(name);
        if existing && !replace {
            return Err(CoordinatorError::config(format!(
                "agent '{name}' is already registered"
            )));
        }
        if !existing {
            inner.order.push(name.to_string());
        }
        inner.agents.insert(name.to_string(), agent);
        info!(agent = name, replace, "agent registered");
        Ok(())
    }

    /// Returns the agent, or `UnknownAgent`.
    pub fn lookup(&self, agent_name: &str) -> Result<Arc<dyn Agent>> {
        self.inner
            .read()
            .agents
            .get(agent_name)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownAgent {
                agent: agent_name.to_string(),
            })
    }

    /// Validates that `(agent_name, action_name)` resolves, returning the
    /// agent (the `Action` itself borrows from it, so callers re-resolve
    /// via `agent.action(action_name)` at invocation time).
    pub fn lookup_action(&self, agent_name: &str, action_name: &str) -> Result<Arc<dyn Agent>> {
        let agent = self.lookup(agent_name)?;
        if agent.action(action_name).is_none() {
            return Err(CoordinatorError::UnknownAction {
                agent: agent_name.to_string(),
                action: action_name.to_string(),
            });
        }
        Ok(agent)
    }

    /// Run every agent's `on_start` in registration order. On failure,
    /// already-started agents are rolled back (`on_stop`, reverse order)
    /// and the triggering cause is returned. On success the registry is
    /// sealed: no further `register` calls succeed.
    pub fn start_all(&self) -> Result<()> {
        let (order, agents) = {
            let inner = self.inner.read();
            (inner.order.clone(), inner.agents.clone())
        };

        let mut started = Vec::with_capacity(order.len());
        for name in &order {
            let agent = &agents[name];
            match agent.on_start() {
                Ok(()) => started.push(name.clone()),
                Err(cause) => {
                    error!(agent = %name, error = %cause, "on_start failed, rolling back");
                    for rollback_name in started.iter().rev() {
                        if let Err(stop_err) = agents[rollback_name].on_stop() {
                            warn!(agent = %rollback_name, error = %stop_err, "rollback on_stop failed");
                        }
                    }
                    return Err(cause);
                }
            }
        }

        self.inner.write().sealed = true;
        info!(count = order.len(), "registry sealed after start_all");
        Ok(())
    }

    /// Run every agent's `on_stop` in reverse registration order.
    /// Best-effort: a failing agent does not prevent the others from
    /// stopping. Returns the first error encountered, if any.
    pub fn stop_all(&self) -> Result<()> {
        let (order, agents) = {
            let inner = self.inner.read();
            (inner.order.clone(), inner.agents.clone())
        };

        let mut first_err = None;
        for name in order.iter().rev() {
            if let Err(e) = agents[name].on_stop() {
                error!(agent = %name, error = %e, "on_stop failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Explicitly seal the registry (equivalent to what `start_all`
    /// guarantees) for hosts that manage agent lifecycles themselves but
    /// still want the post-submission mutation guard enforced.
    pub fn seal(&self) {
        self.inner.write().sealed = true;
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.inner.read().sealed
    }

    #[must_use]
    pub fn agent_names(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
