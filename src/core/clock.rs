use std::time::Instant;

/// Generation clock - monotonic time since a generation started
/// Callers pass `now` so the loop and tests share one time source
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    /// Create clock starting at `now`
    pub fn starting_at(now: Instant) -> Self {
        Self { start: now }
    }

    /// Seconds elapsed since the clock started
    pub fn elapsed(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clock_measures_elapsed() {
        let t0 = Instant::now();
        let clock = Clock::starting_at(t0);

        assert_eq!(clock.elapsed(t0), 0.0);
        assert!((clock.elapsed(t0 + Duration::from_millis(1500)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let t0 = Instant::now();
        let clock = Clock::starting_at(t0 + Duration::from_secs(1));
        assert_eq!(clock.elapsed(t0), 0.0);
    }
}
