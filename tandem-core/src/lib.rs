//! ABOUTME: Clock/Context, error taxonomy, tagged value type, and Agent/Action traits
//! ABOUTME: The leaf layer of the Tandem coordinator — depended on by every other crate

pub mod clock;
pub mod context;
pub mod error;
pub mod traits;
pub mod value;

pub use clock::{system_clock, Clock, FakeClock, SharedClock, SystemClock};
pub use context::Context;
pub use error::{CoordinatorError, ErrorKind, Result};
pub use traits::{Action, Agent, NullStatusPublisher, StatusPublisher};
pub use value::{params, Params, Value};
