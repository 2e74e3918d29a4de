//! Time source for the engine.
//!
//! Every component reads "now" through a [`Clock`], so tests can drive
//! deadlines and sweeps with a [`ManualClock`].

use std::time::Duration;

use parking_lot::Mutex;

use workix_core::Timestamp;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: Timestamp) {
        *self.now.lock() = at;
    }

    /// Move forward by `by`. Saturates at the current time on overflow.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add(by) {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(Timestamp::parse("2026-03-02T08:00:00Z").unwrap());
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now().to_iso8601(), "2026-03-02T08:01:30Z");
        clock.set(Timestamp::parse("2026-03-03T00:00:00Z").unwrap());
        assert_eq!(clock.now().to_iso8601(), "2026-03-03T00:00:00Z");
    }
}
