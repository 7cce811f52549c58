//! Round countdown clock: fixed-step decrement with an explicit floor at zero.

/// Amount subtracted from the clock on every fast tick (~60 Hz).
pub const FAST_TICK_SECS: f64 = 0.016;

/// Value the engine forces onto the clock on timeout; rounds to "0.0" on screen.
pub const TIMEOUT_DISPLAY: f64 = 0.04;

/// Countdown clock for one round. The stored value never goes below 0; at a
/// 16 ms step the raw subtraction can land slightly negative, so callers must
/// compare with `<= 0.0`, never `== 0.0`.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    remaining: f64,
    start: f64,
}

impl Clock {
    pub fn new(start: f64) -> Self {
        Self {
            remaining: start,
            start,
        }
    }

    /// Subtract one fast-tick step, clamping at zero.
    pub fn tick(&mut self) {
        self.remaining -= FAST_TICK_SECS;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
        }
    }

    /// Green/red tile resolution: shift the clock by `delta` seconds.
    /// A shift below zero clamps; the next fast tick then reads it as expired.
    pub fn adjust(&mut self, delta: f64) {
        self.remaining = (self.remaining + delta).max(0.0);
    }

    /// Reset to the mode's start value (easy-mode round advance).
    pub fn reset(&mut self) {
        self.remaining = self.start;
    }

    /// Force the timeout display value before the clock freezes.
    pub fn freeze_at_timeout(&mut self) {
        self.remaining = TIMEOUT_DISPLAY;
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn start_value(&self) -> f64 {
        self.start
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_never_goes_negative() {
        let mut clock = Clock::new(0.05);
        for _ in 0..100 {
            clock.tick();
            assert!(clock.remaining() >= 0.0);
        }
        assert_eq!(clock.remaining(), 0.0);
    }

    #[test]
    fn zero_is_sticky_until_reset() {
        let mut clock = Clock::new(0.02);
        clock.tick();
        clock.tick();
        assert!(clock.expired());
        clock.tick();
        assert_eq!(clock.remaining(), 0.0);
        clock.reset();
        assert_eq!(clock.remaining(), 0.02);
    }

    #[test]
    fn adjust_clamps_below_zero() {
        let mut clock = Clock::new(0.3);
        clock.adjust(-0.5);
        assert_eq!(clock.remaining(), 0.0);
        assert!(clock.expired());
    }

    #[test]
    fn adjust_adds_time() {
        let mut clock = Clock::new(10.0);
        clock.adjust(0.5);
        assert_eq!(clock.remaining(), 10.5);
    }

    #[test]
    fn expiry_fires_even_when_step_skips_past_zero() {
        // 0.01 - 0.016 lands negative; the floor makes <= 0.0 reliable.
        let mut clock = Clock::new(0.01);
        clock.tick();
        assert!(clock.expired());
        assert_eq!(clock.remaining(), 0.0);
    }
}
