//! Process-wide ticking time source
//!
//! Every temporal decision in the engine reads the same [`Clock`] instead
//! of sampling wall-clock time ad hoc, so the store sweep, the threshold
//! notifier and the alarm manager all reason about the identical "now"
//! within one tick. The engine refreshes the clock once per tick; a frozen
//! clock is advanced manually in tests.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Shared time source. Clones observe the same instant.
#[derive(Debug, Clone)]
pub struct Clock {
    now: Arc<RwLock<DateTime<Utc>>>,
    frozen: bool,
}

impl Clock {
    /// A live clock, initialized to the current system time.
    pub fn new() -> Self {
        Self {
            now: Arc::new(RwLock::new(Utc::now())),
            frozen: false,
        }
    }

    /// A frozen clock pinned to `instant`. `refresh` keeps the stored
    /// value; advance it with [`Clock::set`].
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(instant)),
            frozen: true,
        }
    }

    /// The instant of the most recent refresh.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    /// Sample system time into the clock and return it. Frozen clocks
    /// return their pinned instant unchanged.
    pub fn refresh(&self) -> DateTime<Utc> {
        if self.frozen {
            return self.now();
        }
        let instant = Utc::now();
        self.store(instant);
        instant
    }

    /// Pin the clock to `instant`. All clones observe the change.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.store(instant);
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let next = self.now() + delta;
        self.store(next);
    }

    fn store(&self, instant: DateTime<Utc>) {
        match self.now.write() {
            Ok(mut guard) => *guard = instant,
            Err(poisoned) => *poisoned.into_inner() = instant,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_fixed_clock_ignores_refresh() {
        let pinned = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let clock = Clock::fixed(pinned);
        assert_eq!(clock.refresh(), pinned);
        assert_eq!(clock.now(), pinned);
    }

    #[test]
    fn test_clones_share_the_instant() {
        let pinned = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let clock = Clock::fixed(pinned);
        let observer = clock.clone();

        clock.advance(Duration::seconds(90));
        assert_eq!(observer.now(), pinned + Duration::seconds(90));
    }

    #[test]
    fn test_live_clock_refresh_moves_forward() {
        let clock = Clock::new();
        let before = clock.now();
        let refreshed = clock.refresh();
        assert!(refreshed >= before);
    }
}
