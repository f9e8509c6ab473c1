use std::time::Duration;

use super::frame_clock::{RealTime, SimTime};

/// Frame rate used while the window is unfocused and background throttling is on.
pub const BACKGROUND_FRAME_RATE: f64 = 4.0;

/// Fraction of the corrected wait actually requested from the sleeper.
const SLEEP_FRACTION: f64 = 0.97;

/// Relative change in overshoot above which the estimate is replaced outright.
const SNAP_THRESHOLD: f64 = 0.4;

/// Blend factor for small overshoot changes.
const SMOOTHING: f64 = 0.1;

/// How much simulation time advances per loop iteration.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum SimTimeStep {
    /// The measured real time step.
    RealTime,
    /// The wall-clock target frame duration, regardless of how long the frame took.
    #[default]
    MatchRealTimeTarget,
    /// A fixed number of seconds.
    Fixed(SimTime),
}

impl SimTimeStep {
    /// Resolves the step before scaling.
    pub fn resolve(self, real_step: RealTime, target_duration: RealTime) -> SimTime {
        match self {
            SimTimeStep::RealTime => real_step,
            SimTimeStep::MatchRealTimeTarget => target_duration,
            SimTimeStep::Fixed(s) => s,
        }
    }
}

/// Learns how far the platform sleep overshoots and compensates.
#[derive(Debug, Copy, Clone, Default)]
pub struct WaitEstimator {
    over_wait: RealTime,
}

impl WaitEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current overshoot estimate, in seconds. Negative means sleeps end early.
    #[inline]
    pub fn over_wait(&self) -> RealTime {
        self.over_wait
    }

    /// How long to sleep to wait `desired` seconds in practice.
    pub fn sleep_time(&self, desired: RealTime) -> Duration {
        let secs = (desired - self.over_wait).max(0.0) * SLEEP_FRACTION;
        Duration::from_secs_f64(secs)
    }

    /// Feeds back the wait that actually happened.
    pub fn record(&mut self, desired: RealTime, actual: RealTime) {
        let this = actual - desired;
        let last = self.over_wait;
        let scale = last.abs().max(this.abs());

        // Equal values (including both zero) count as no change.
        if scale > 0.0 && (this - last).abs() / scale > SNAP_THRESHOLD {
            self.over_wait = this;
        } else {
            self.over_wait = last + (this - last) * SMOOTHING;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    // ── sim step ──────────────────────────────────────────────────────────

    #[test]
    fn sim_step_resolution() {
        assert!(close(SimTimeStep::RealTime.resolve(0.02, 1.0 / 60.0), 0.02));
        assert!(close(SimTimeStep::MatchRealTimeTarget.resolve(0.02, 0.5), 0.5));
        assert!(close(SimTimeStep::Fixed(0.001).resolve(0.02, 0.5), 0.001));
        assert_eq!(SimTimeStep::default(), SimTimeStep::MatchRealTimeTarget);
    }

    // ── wait estimation ───────────────────────────────────────────────────

    #[test]
    fn fresh_estimator_sleeps_most_of_desired() {
        let w = WaitEstimator::new();
        assert!(close(w.sleep_time(0.010).as_secs_f64(), 0.0097));
        assert_eq!(w.sleep_time(-1.0), Duration::ZERO);
    }

    #[test]
    fn large_change_snaps() {
        let mut w = WaitEstimator::new();
        w.record(0.010, 0.012);
        assert!(close(w.over_wait(), 0.002));

        // 0.002 -> 0.004 is a 50% change.
        w.record(0.010, 0.014);
        assert!(close(w.over_wait(), 0.004));
    }

    #[test]
    fn small_change_is_smoothed() {
        let mut w = WaitEstimator::new();
        w.record(0.010, 0.012);

        // 0.002 -> 0.0022 is a 9% change.
        w.record(0.010, 0.0122);
        assert!(close(w.over_wait(), 0.002 + 0.0002 * 0.1));
    }

    #[test]
    fn estimate_shortens_next_sleep() {
        let mut w = WaitEstimator::new();
        w.record(0.010, 0.013);
        assert!(close(w.sleep_time(0.010).as_secs_f64(), 0.007 * 0.97));
        // Overshoot larger than the wait means no sleep.
        assert_eq!(w.sleep_time(0.002), Duration::ZERO);
    }

    #[test]
    fn zero_overshoot_stays_zero() {
        let mut w = WaitEstimator::new();
        w.record(0.01, 0.01);
        assert_eq!(w.over_wait(), 0.0);
    }
}
