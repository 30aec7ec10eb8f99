//! ABOUTME: Status Bus — non-blocking fan-out of workflow lifecycle events (spec §4.5)
//! ABOUTME: Depends only on tandem-core for ErrorKind; owns no agent or workflow state

pub mod bus;
pub mod event;

pub use bus::{EventBus, StatusHandler, SubscriptionHandle};
pub use event::{StatusEvent, StepOutcomeSummary, WorkflowOutcomeSummary};
