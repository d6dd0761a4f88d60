use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

/// Nominal length of one world tick
pub const TICK_DURATION: Duration = Duration::from_millis(50);

const MIN_TICK_DURATION: Duration = Duration::from_millis(1);
const DRIFT_STEP: Duration = Duration::from_millis(1);

/// Local tick counter kept in step with the server's world age.
///
/// Ticks advance on wall time. The first time update from the server sets the
/// counter; later updates nudge the tick length by a millisecond toward the
/// server rather than jumping.
#[derive(Debug, Clone)]
pub struct Clock {
    current_tick: u64,
    current_tick_end: Instant,
    tick_duration: Duration,
    synced: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            current_tick: 0,
            current_tick_end: start + TICK_DURATION,
            tick_duration: TICK_DURATION,
            synced: false,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// When the current tick ends and the next begins
    pub fn current_tick_end(&self) -> Instant {
        self.current_tick_end
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Apply a server time update
    pub fn sync(&mut self, world_age: u64) {
        if !self.synced {
            self.current_tick = world_age;
            self.synced = true;
            debug!(target: "clock", "Clock synced to world age {}", world_age);
            return;
        }

        if world_age > self.current_tick && self.tick_duration > MIN_TICK_DURATION {
            self.tick_duration -= DRIFT_STEP;
        } else if world_age < self.current_tick {
            self.tick_duration += DRIFT_STEP;
        }
        trace!(target: "clock", "Tick duration now {} ms", self.tick_duration.as_millis());
    }

    /// Advance to `now`, returning how many ticks elapsed
    pub fn advance_to(&mut self, now: Instant) -> u64 {
        let mut elapsed = 0;
        while self.current_tick_end <= now {
            self.current_tick += 1;
            self.current_tick_end += self.tick_duration;
            elapsed += 1;
        }
        if elapsed > 0 {
            trace!(target: "clock", "Tick {}", self.current_tick);
        }
        elapsed
    }

    pub fn advance(&mut self) -> u64 {
        self.advance_to(Instant::now())
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

    #[test]
    fn test_advance_counts_whole_ticks() {
        let start = Instant::now();
        let mut clock = Clock::starting_at(start);

        assert_eq!(clock.advance_to(start + Duration::from_millis(49)), 0);
        assert_eq!(clock.current_tick(), 0);

        assert_eq!(clock.advance_to(start + Duration::from_millis(50)), 1);
        assert_eq!(clock.advance_to(start + Duration::from_millis(175)), 2);
        assert_eq!(clock.current_tick(), 3);
        assert_eq!(clock.current_tick_end(), start + Duration::from_millis(200));
    }

    #[test]
    fn test_first_sync_sets_counter() {
        let mut clock = Clock::starting_at(Instant::now());
        clock.sync(6000);
        assert!(clock.is_synced());
        assert_eq!(clock.current_tick(), 6000);
        assert_eq!(clock.tick_duration(), TICK_DURATION);
    }

    #[test]
    fn test_later_syncs_adjust_tick_length() {
        let mut clock = Clock::starting_at(Instant::now());
        clock.sync(100);

        // Server ahead of us: shorten ticks
        clock.sync(105);
        assert_eq!(clock.tick_duration(), Duration::from_millis(49));
        assert_eq!(clock.current_tick(), 100);

        // Server behind us: lengthen ticks
        clock.sync(90);
        clock.sync(90);
        assert_eq!(clock.tick_duration(), Duration::from_millis(51));
    }

    #[test]
    fn test_tick_length_never_reaches_zero() {
        let mut clock = Clock::starting_at(Instant::now());
        clock.sync(0);
        for _ in 0..100 {
            clock.sync(u64::MAX);
        }
        assert_eq!(clock.tick_duration(), MIN_TICK_DURATION);
    }
}
