//! Rise detection
//!
//! A rise is a fast frequency excursion followed by a slow decay back to a
//! settled value. Per trajectory the detector scans the valid samples in
//! three phases: find a candidate peak (every sample in the following peak
//! window lies strictly below it), find the end of the decay (the following
//! end window no longer drops, or its median has flattened out, or the
//! samples run out), then accept the excursion if the peak-to-settled drop
//! exceeds a threshold that grows with the excursion duration. A candidate
//! is abandoned when the frequency recovers above the peak or the excursion
//! exceeds the maximum rise duration.
//!
//! Accepted rises never span silence: if the stretch leading into the peak
//! contains a long gap, the recorded start moves to the first valid sample
//! after it. Scanning resumes strictly after each accepted rise.

use eodtrack_common::{Rise, TimeAxis, TrackerConfig, Trajectory};

/// Windowed rise scan with all windows converted to step units.
pub struct RiseDetector {
    threshold: f64,
    peak_window: f64,
    /// Minimum valid content of the peak window, ~1 s
    min_peak_content: f64,
    end_window: f64,
    plateau_tolerance: f64,
    max_duration: f64,
    growth_step: f64,
    gap_lookback: f64,
    gap_min: f64,
}

impl RiseDetector {
    pub fn new(axis: &TimeAxis, config: &TrackerConfig) -> Self {
        Self {
            threshold: config.rise_threshold,
            peak_window: axis.seconds_to_steps(config.peak_window_s),
            min_peak_content: axis.seconds_to_steps(1.0),
            end_window: axis.seconds_to_steps(config.end_window_s),
            plateau_tolerance: config.plateau_tolerance_hz,
            max_duration: axis.minutes_to_steps(config.max_rise_duration_min),
            growth_step: axis.seconds_to_steps(config.threshold_growth_step_s),
            gap_lookback: axis.seconds_to_steps(config.gap_shift_lookback_s),
            gap_min: axis.seconds_to_steps(config.gap_shift_min_gap_s),
        }
    }

    /// Detect all rises of one trajectory, in index order.
    pub fn detect(&self, trajectory: &Trajectory) -> Vec<Rise> {
        let valid = trajectory.valid_indices();
        let mut rises = Vec::new();
        let mut lo = 0;

        while lo < valid.len() {
            let span = &valid[lo..];
            let spread = (span[span.len() - 1] - span[0]) as f64;
            if spread <= self.peak_window + 1.0 {
                break;
            }
            match self.find_single_rise(trajectory, span) {
                Some((rise, resume)) => {
                    rises.push(rise);
                    lo += resume;
                }
                None => break,
            }
        }

        rises
    }

    /// Find the next rise within `span` (positions into the trajectory's
    /// valid indices). Returns the rise and the span position to resume at.
    fn find_single_rise(&self, trajectory: &Trajectory, span: &[usize]) -> Option<(Rise, usize)> {
        let values: Vec<f64> = span
            .iter()
            .map(|&idx| trajectory.get(idx))
            .collect::<Option<Vec<_>>>()?;
        let last = span.len() - 1;

        for i in 0..span.len() {
            // candidate peaks keep at least the peak window before the end
            if ((span[last] - span[i]) as f64) < self.peak_window {
                break;
            }

            let peak_end = span
                .iter()
                .rposition(|&idx| (idx as f64 - span[i] as f64) < self.peak_window)
                .unwrap_or(i);
            let peak_range = (i + 1)..peak_end;
            if (peak_range.len() as f64) < self.min_peak_content {
                continue;
            }
            if !peak_range.clone().all(|q| values[q] < values[i]) {
                continue;
            }

            // peak found, search for the end of the decay
            for j in (i + 1)..span.len() {
                if ((span[last] - span[j]) as f64) < self.peak_window {
                    break;
                }
                if values[j] >= values[i] {
                    break;
                }
                if ((span[j] - span[i]) as f64) >= self.max_duration {
                    break;
                }

                let decay_end = span
                    .iter()
                    .rposition(|&idx| (idx as f64 - span[j] as f64) < self.end_window)
                    .unwrap_or(j);
                let window: Vec<f64> = ((j + 1)..decay_end).map(|q| values[q]).collect();

                let stopped_dropping = window.iter().all(|&v| v >= values[j]);
                let plateau = !window.is_empty()
                    && values[j] - median(&window) < self.plateau_tolerance;

                if stopped_dropping || j == last || plateau {
                    let growth = (((span[j] - span[i]) as f64) / self.growth_step).floor();
                    let required = self.threshold + growth * self.threshold;
                    if values[i] - values[j] >= required {
                        let start = self.shift_start_over_gap(span, i);
                        let rise =
                            Rise::new(span[start], span[j], values[start], values[j]);
                        return Some((rise, j + 1));
                    }
                    // drop too small for this duration, restart at the next peak
                    break;
                }
            }
        }

        None
    }

    /// If the lookback window before the peak contains a silence of at least
    /// the minimum gap, move the start to the first valid sample after the
    /// last such silence.
    fn shift_start_over_gap(&self, span: &[usize], peak: usize) -> usize {
        let window_start = span[peak] as f64 - self.gap_lookback;
        let mut shifted = None;
        let mut previous: Option<usize> = None;

        for (pos, &idx) in span.iter().enumerate().take(peak + 1) {
            if (idx as f64) <= window_start {
                continue;
            }
            let gap = match previous {
                Some(prev) => (idx - prev) as f64,
                None => idx as f64 - window_start,
            };
            if gap >= self.gap_min {
                shifted = Some(pos);
            }
            previous = Some(idx);
        }

        shifted.unwrap_or(peak)
    }
}

fn median(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
