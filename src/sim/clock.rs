//! Fixed-step frame clock
//!
//! Turns variable host frame deltas into a whole number of fixed simulation
//! steps. Stalls are clamped to one frame, negative deltas to zero, and the
//! remainder carries into the next call.

use crate::consts::{FRAME_MS, MAX_SUBSTEPS, STALL_THRESHOLD_MS};

#[derive(Debug, Clone)]
pub struct FrameClock {
    step_ms: f64,
    accumulator: f64,
    paused: bool,
    /// Discard the next host delta (set on resume)
    resync: bool,
    max_substeps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_MS)
    }
}

impl FrameClock {
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ms,
            accumulator: 0.0,
            paused: false,
            resync: false,
            max_substeps: MAX_SUBSTEPS,
        }
    }

    #[inline]
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Accumulate a host delta and return how many fixed steps to run
    pub fn advance(&mut self, host_delta_ms: f64) -> u32 {
        if self.paused {
            return 0;
        }
        if self.resync {
            self.resync = false;
            return 0;
        }

        let delta = if !host_delta_ms.is_finite() || host_delta_ms < 0.0 {
            log::warn!("Clock anomaly: host delta {host_delta_ms} clamped to 0");
            0.0
        } else if host_delta_ms > STALL_THRESHOLD_MS {
            log::debug!("Host stall of {host_delta_ms:.1}ms treated as one frame");
            self.step_ms
        } else {
            host_delta_ms
        };

        self.accumulator += delta;
        let mut steps = 0;
        while self.accumulator >= self.step_ms && steps < self.max_substeps {
            self.accumulator -= self.step_ms;
            steps += 1;
        }
        // Spiral guard: drop whole frames we could not run, keep the fraction
        if self.accumulator >= self.step_ms {
            self.accumulator %= self.step_ms;
        }
        steps
    }

    /// Freeze advancement. The accumulator is kept as-is.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unfreeze and resynchronize so the paused interval is never replayed
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.resync = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_with_remainder() {
        let mut clock = FrameClock::new(10.0);
        assert_eq!(clock.advance(25.0), 2);
        assert!((clock.accumulator() - 5.0).abs() < 1e-9);
        assert_eq!(clock.advance(5.0), 1);
        assert!(clock.accumulator().abs() < 1e-9);
    }

    #[test]
    fn test_stall_clamped_to_one_frame() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(5000.0), 1);
    }

    #[test]
    fn test_negative_and_nan_deltas_do_nothing() {
        let mut clock = FrameClock::new(10.0);
        clock.advance(4.0);
        assert_eq!(clock.advance(-30.0), 0);
        assert_eq!(clock.advance(f64::NAN), 0);
        assert!((clock.accumulator() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_freezes_and_resume_resyncs() {
        let mut clock = FrameClock::new(10.0);
        clock.advance(7.0);
        clock.pause();
        assert_eq!(clock.advance(50.0), 0);
        assert!((clock.accumulator() - 7.0).abs() < 1e-9);

        clock.resume();
        // First delta after resume covers the paused gap and is discarded
        assert_eq!(clock.advance(90.0), 0);
        assert_eq!(clock.advance(3.0), 1);
    }

    #[test]
    fn test_frame_rate_independent() {
        let mut fast = FrameClock::new(10.0);
        let mut slow = FrameClock::new(10.0);
        let fast_steps: u32 = (0..120).map(|_| fast.advance(2.5)).sum();
        let slow_steps: u32 = (0..10).map(|_| slow.advance(30.0)).sum();
        assert_eq!(fast_steps, 30);
        assert_eq!(slow_steps, 30);
    }
}
