//! Combo Gate
//!
//! Tracks consecutive typing activity and decides, per change, whether
//! power mode effects fire at all.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Streak counter and the time of the last qualifying activity
#[derive(Debug, Clone, Copy)]
pub struct ComboState {
    pub streak: u32,
    pub last_activity: Instant,
}

/// Threshold and timeout the gate evaluates against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboRules {
    /// Streak needed to activate; 0 means always active
    pub threshold: u32,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct ComboGate {
    state: Mutex<ComboState>,
}

impl ComboGate {
    pub fn new(now: Instant) -> Self {
        Self {
            state: Mutex::new(ComboState {
                streak: 0,
                last_activity: now,
            }),
        }
    }

    /// Record one activity at `now` and report whether effects should fire.
    ///
    /// With a zero threshold the gate is always open and only the activity
    /// time moves. Otherwise the streak grows by one, restarts at 1 when the
    /// gap since the last activity exceeds the timeout, and the gate opens
    /// once the streak reaches the threshold.
    pub fn evaluate(&self, now: Instant, rules: ComboRules) -> bool {
        let mut state = self.state.lock();

        if rules.threshold == 0 {
            state.last_activity = now;
            return true;
        }

        state.streak = state.streak.saturating_add(1);
        if now.saturating_duration_since(state.last_activity) > rules.timeout {
            log::debug!("[ComboGate] Combo broken after {} presses", state.streak - 1);
            state.streak = 1;
        }
        state.last_activity = now;

        let active = state.streak >= rules.threshold;
        if active && state.streak == rules.threshold {
            log::debug!("[ComboGate] Combo reached {} presses, power mode on", state.streak);
        }
        active
    }

    pub fn state(&self) -> ComboState {
        *self.state.lock()
    }

    pub fn streak(&self) -> u32 {
        self.state.lock().streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(1000);

    fn rules(threshold: u32) -> ComboRules {
        ComboRules {
            threshold,
            timeout: TIMEOUT,
        }
    }

    #[test]
    fn test_zero_threshold_always_fires() {
        let start = Instant::now();
        let gate = ComboGate::new(start);

        for i in 0..5 {
            let now = start + TIMEOUT * 3 * i;
            assert!(gate.evaluate(now, rules(0)));
            assert_eq!(gate.state().last_activity, now);
        }
        assert_eq!(gate.streak(), 0);
    }

    #[test]
    fn test_threshold_reached_on_tth_press() {
        let start = Instant::now();
        let gate = ComboGate::new(start);
        let step = Duration::from_millis(50);

        for i in 1..4 {
            assert!(!gate.evaluate(start + step * i, rules(4)), "press {i} fired early");
        }
        assert!(gate.evaluate(start + step * 4, rules(4)));
        assert!(gate.evaluate(start + step * 5, rules(4)));
        assert_eq!(gate.streak(), 5);
    }

    #[test]
    fn test_timeout_resets_streak_to_one() {
        let start = Instant::now();
        let gate = ComboGate::new(start);
        let step = Duration::from_millis(50);

        for i in 1..=3 {
            gate.evaluate(start + step * i, rules(3));
        }
        assert_eq!(gate.streak(), 3);

        let late = start + step * 3 + TIMEOUT + Duration::from_millis(1);
        assert!(!gate.evaluate(late, rules(3)));
        assert_eq!(gate.streak(), 1);
    }

    #[test]
    fn test_threshold_one_fires_after_timeout() {
        let start = Instant::now();
        let gate = ComboGate::new(start);
        let late = start + TIMEOUT * 2;

        assert!(gate.evaluate(late, rules(1)));
        assert_eq!(gate.streak(), 1);
    }

    #[test]
    fn test_gap_equal_to_timeout_keeps_streak() {
        let start = Instant::now();
        let gate = ComboGate::new(start);

        gate.evaluate(start, rules(2));
        assert!(gate.evaluate(start + TIMEOUT, rules(2)));
    }
}
