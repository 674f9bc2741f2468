//! Self-contained timers driven by wall-clock instants
use std::time::{Duration, Instant};

/// Fixed rate sampler - accepts at most one event per interval
#[derive(Debug, Clone, Copy)]
pub struct FixedRate {
    interval: Duration,
    next_due: Instant,
}

impl FixedRate {
    /// Create sampler that fires at given frequency, first slot open at `start`
    pub fn new(hz: u32, start: Instant) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / hz.max(1) as f64),
            next_due: start,
        }
    }

    /// Returns true if an event at `at` falls into an open slot
    /// Skipped slots are dropped, never replayed
    pub fn tick(&mut self, at: Instant) -> bool {
        if at < self.next_due {
            return false;
        }
        while self.next_due <= at {
            self.next_due += self.interval;
        }
        true
    }
}

/// Countdown timer - expires once at a fixed deadline
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    started: Instant,
    deadline: Instant,
}

impl Countdown {
    /// Start countdown at `now`
    pub fn start(now: Instant, duration: Duration) -> Self {
        Self {
            started: now,
            deadline: now + duration,
        }
    }

    /// True once `now` has reached the deadline
    pub fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// True if an event stamped `at` belongs inside the window
    pub fn contains(&self, at: Instant) -> bool {
        at >= self.started && at < self.deadline
    }

    /// Get progress [0, 1]
    pub fn progress(&self, now: Instant) -> f32 {
        let total = self.deadline.duration_since(self.started).as_secs_f32();
        if total == 0.0 {
            return 1.0;
        }
        (now.saturating_duration_since(self.started).as_secs_f32() / total).min(1.0)
    }
}

/// Throttled timer - minimum interval between fires
#[derive(Debug, Clone, Copy)]
pub struct Throttled {
    min_interval: Duration,
    last_fire: Option<Instant>,
}

impl Throttled {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fire: None, // Allow immediate first tick
        }
    }

    /// Attempt to fire, returns true if enough time has passed
    pub fn try_tick(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last_fire = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fixed_rate_fires_at_rate() {
        let t0 = Instant::now();
        let mut sampler = FixedRate::new(10, t0); // 100ms slots

        assert!(sampler.tick(t0));
        assert!(!sampler.tick(t0 + ms(50)));
        assert!(sampler.tick(t0 + ms(100)));
        assert!(!sampler.tick(t0 + ms(150)));
    }

    #[test]
    fn fixed_rate_drops_missed_slots() {
        let t0 = Instant::now();
        let mut sampler = FixedRate::new(10, t0);

        assert!(sampler.tick(t0));
        // Long stall: one event, not a burst of catch-up events
        assert!(sampler.tick(t0 + ms(550)));
        assert!(!sampler.tick(t0 + ms(560)));
        assert!(sampler.tick(t0 + ms(600)));
    }

    #[test]
    fn countdown_expires_at_deadline() {
        let t0 = Instant::now();
        let timer = Countdown::start(t0, Duration::from_secs(10));

        assert!(!timer.expired(t0 + ms(9_999)));
        assert!(timer.expired(t0 + ms(10_000)));
        assert_eq!(timer.progress(t0 + ms(5_000)), 0.5);
        assert_eq!(timer.progress(t0 + ms(20_000)), 1.0);
    }

    #[test]
    fn countdown_window_is_half_open() {
        let t0 = Instant::now();
        let timer = Countdown::start(t0, Duration::from_secs(1));

        assert!(timer.contains(t0));
        assert!(timer.contains(t0 + ms(999)));
        assert!(!timer.contains(t0 + ms(1_000)));
    }

    #[test]
    fn throttled_enforces_minimum() {
        let t0 = Instant::now();
        let mut timer = Throttled::new(ms(100));

        assert!(timer.try_tick(t0));
        assert!(!timer.try_tick(t0 + ms(50)));
        assert!(timer.try_tick(t0 + ms(110)));
    }
}
