//! ABOUTME: Clock abstraction for testable monotonic time (§4.1)
//! ABOUTME: Every timed operation in the coordinator consults a Clock rather than Instant::now()

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A source of monotonic time. Production code uses `SystemClock`; tests
/// inject a `FakeClock` so timeout and deadline behaviour is deterministic
/// instead of racing the wall clock.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;
}

/// Real monotonic clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Controllable clock for tests: advances only when told to.
#[derive(Debug, Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

/// Shared handle to a `Clock` implementation, threaded through every
/// component that needs to measure elapsed time or compare against a
/// deadline.
pub type SharedClock = Arc<dyn Clock>;

#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
