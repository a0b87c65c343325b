//! Time source for entry timestamps.
//!
//! Entries are stamped with local time including the UTC offset. The clock
//! is injectable so ages can be simulated without sleeping.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Local};

/// Source of "now" for stamping and ageing cache entries.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Start at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now())
    }

    pub fn set(&self, at: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_shared_state() {
        let clock = ManualClock::starting_now();
        let copy = clock.clone();
        let start = clock.now();

        copy.advance(Duration::seconds(90));

        assert_eq!(clock.now() - start, Duration::seconds(90));
    }

    #[test]
    fn test_system_clock_carries_offset() {
        let now = SystemClock.now();
        assert_eq!(now.offset().local_minus_utc(), Local::now().offset().local_minus_utc());
    }
}
