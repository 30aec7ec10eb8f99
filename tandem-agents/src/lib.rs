//! ABOUTME: Agent Registry (§4.2) and Agent Runtime (§4.3) — the second and third layers of the coordinator
//! ABOUTME: Depends only on tandem-core; knows nothing about workflows, steps, or retries

pub mod registry;
pub mod runtime;

pub use registry::Registry;
pub use runtime::{AgentRuntime, InvocationOutcome, DEFAULT_GRACE_PERIOD, DEFAULT_MAX_OUTPUT_BYTES};
