//! Nullable clock: deterministic time for testing.

use gauge_types::Timestamp;
use std::cell::Cell;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
#[derive(Debug, Default)]
pub struct NullClock {
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    /// Advance time by a number of seconds. Saturates at `u64::MAX`.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.current.set(self.current.get().saturating_add(secs));
        self.now()
    }

    /// Jump to `at` if it lies in the future.
    pub fn advance_to(&self, at: Timestamp) -> Timestamp {
        if at.as_secs() > self.current.get() {
            self.current.set(at.as_secs());
        }
        self.now()
    }

    pub fn set(&self, secs: u64) {
        self.current.set(secs);
    }
}
