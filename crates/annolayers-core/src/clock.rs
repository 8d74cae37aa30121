//! Time source for the lock recovery timers.
//!
//! The store has no event loop of its own. Timers are deadlines measured
//! against a [`Clock`] and checked whenever the store is touched or
//! [`StateStore::tick`](crate::StateStore::tick) is called by the host.

use std::cell::Cell;
use std::time::Duration;

// Use web-time on WASM, std::time otherwise
#[cfg(target_arch = "wasm32")]
pub use web_time::{Instant, SystemTime};
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Instant, SystemTime};

/// A monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Cell<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}
