//! Time axis utilities
//!
//! The extraction front-end supplies one timestamp per analysis step. All
//! minute- and second-based tunables are converted to step counts through
//! the axis spacing, so every stage of the tracker works in step units.

use crate::{Error, Result};

/// Relative tolerance when checking the axis for uniform spacing
const SPACING_EPSILON: f64 = 1e-6;

/// Strictly increasing, uniformly spaced time axis in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    times: Vec<f64>,
    delta: f64,
}

impl TimeAxis {
    /// Validate and wrap a timestamp sequence.
    ///
    /// Fails on fewer than two timestamps, non-increasing timestamps, or
    /// spacing that deviates from the first interval by more than a small
    /// relative epsilon.
    pub fn new(times: Vec<f64>) -> Result<Self> {
        if times.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "time axis needs at least 2 timestamps, got {}",
                times.len()
            )));
        }

        let delta = times[1] - times[0];
        if delta <= 0.0 {
            return Err(Error::InvalidInput(
                "time axis must be strictly increasing".to_string(),
            ));
        }

        for (i, pair) in times.windows(2).enumerate() {
            let step = pair[1] - pair[0];
            if step <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "time axis not strictly increasing at index {}",
                    i + 1
                )));
            }
            if ((step - delta) / delta).abs() > SPACING_EPSILON {
                return Err(Error::InvalidInput(format!(
                    "time axis spacing is not uniform at index {}: {} vs {}",
                    i + 1,
                    step,
                    delta
                )));
            }
        }

        Ok(Self { times, delta })
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Raw timestamps in seconds.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Step spacing in seconds.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Detection steps per minute (`dpm` in the field literature).
    pub fn steps_per_minute(&self) -> f64 {
        60.0 / self.delta
    }

    /// Convert a duration in minutes to a (fractional) step count.
    pub fn minutes_to_steps(&self, minutes: f64) -> f64 {
        minutes * self.steps_per_minute()
    }

    /// Convert a duration in seconds to a (fractional) step count.
    pub fn seconds_to_steps(&self, seconds: f64) -> f64 {
        seconds / self.delta
    }

    /// Recording duration in minutes (first to last timestamp).
    pub fn duration_minutes(&self) -> f64 {
        (self.times[self.times.len() - 1] - self.times[0]) / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_axis(n: usize, delta: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * delta).collect()
    }

    #[test]
    fn test_axis_creation() {
        let axis = TimeAxis::new(uniform_axis(100, 0.5)).unwrap();
        assert_eq!(axis.len(), 100);
        assert!((axis.delta() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_too_short_axis_rejected() {
        assert!(TimeAxis::new(vec![]).is_err());
        assert!(TimeAxis::new(vec![0.0]).is_err());
    }

    #[test]
    fn test_non_increasing_axis_rejected() {
        assert!(TimeAxis::new(vec![0.0, 1.0, 1.0, 2.0]).is_err());
        assert!(TimeAxis::new(vec![0.0, 1.0, 0.5]).is_err());
    }

    #[test]
    fn test_non_uniform_axis_rejected() {
        assert!(TimeAxis::new(vec![0.0, 1.0, 2.0, 3.5]).is_err());
    }

    #[test]
    fn test_steps_per_minute() {
        // 0.5 s per step -> 120 steps per minute
        let axis = TimeAxis::new(uniform_axis(10, 0.5)).unwrap();
        assert!((axis.steps_per_minute() - 120.0).abs() < 1e-9);
        assert!((axis.minutes_to_steps(5.0) - 600.0).abs() < 1e-9);
        assert!((axis.seconds_to_steps(10.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_minutes() {
        // 601 steps of 1 s span 600 s = 10 min
        let axis = TimeAxis::new(uniform_axis(601, 1.0)).unwrap();
        assert!((axis.duration_minutes() - 10.0).abs() < 1e-9);
    }
}
