//! Tracker configuration
//!
//! Plain numeric tunables with the empirical defaults of the original field
//! calibration. Values load from a TOML file in which every key is optional;
//! missing keys fall back to the defaults below. There are no behavioral
//! modes, only numbers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// All tunables of the tracking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum frequency difference to assign a candidate to a trajectory (Hz)
    pub frequency_tolerance: f64,

    /// Minutes of continuous absence before a trajectory is no longer
    /// matched against new candidates
    pub prim_time_tolerance_min: f64,

    /// Minimum peak-to-settled frequency drop for a rise (Hz)
    pub rise_threshold: f64,

    /// Maximum time between the end of one trajectory and the start of
    /// another to still consider merging them (minutes)
    pub max_time_tolerance_min: f64,

    /// Maximum frequency difference between two trajectories to consider
    /// merging them (Hz)
    pub frequency_threshold: f64,

    /// Fraction of the recording duration a trajectory must cover to
    /// survive the occurrence filter (capped at one minute)
    pub min_occurrence_fraction: f64,

    // Empirical window calibrations of the rise scan and the merger,
    // preserved exactly as observed in long-term field recordings.
    /// Every sample within this window after a rise peak must lie below it (s)
    pub peak_window_s: f64,
    /// Window for deciding that the decay has ended (s)
    pub end_window_s: f64,
    /// Median tolerance for the plateau end condition (Hz)
    pub plateau_tolerance_hz: f64,
    /// A rise longer than this is abandoned (minutes)
    pub max_rise_duration_min: f64,
    /// The acceptance threshold grows by one `rise_threshold` per this much
    /// excursion duration (s)
    pub threshold_growth_step_s: f64,
    /// Lookback before the peak when searching for a silence to shift the
    /// rise start behind (s)
    pub gap_shift_lookback_s: f64,
    /// Minimum silence that shifts the rise start (s)
    pub gap_shift_min_gap_s: f64,
    /// Two trajectories overlapping in more than this many samples never merge
    pub merge_overlap_cap: usize,
    /// Weight of the time distance in the merge cost (per minute)
    pub merge_alpha: f64,
    /// The assigner prunes short-lived trajectories at this interval (minutes)
    pub assigner_prune_interval_min: f64,
    /// Trajectories with fewer valid samples than this are pruned
    pub min_trajectory_samples: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frequency_tolerance: 0.5,
            prim_time_tolerance_min: 5.0,
            rise_threshold: 0.5,
            max_time_tolerance_min: 10.0,
            frequency_threshold: 5.0,
            min_occurrence_fraction: 0.01,
            peak_window_s: 10.0,
            end_window_s: 30.0,
            plateau_tolerance_hz: 0.05,
            max_rise_duration_min: 10.0,
            threshold_growth_step_s: 30.0,
            gap_shift_lookback_s: 10.0,
            gap_shift_min_gap_s: 3.0,
            merge_overlap_cap: 20,
            merge_alpha: 0.01,
            assigner_prune_interval_min: 30.0,
            min_trajectory_samples: 10,
        }
    }
}

impl TrackerConfig {
    /// Check every tunable before any pipeline stage runs.
    pub fn validate(&self) -> Result<()> {
        let positives = [
            ("frequency_tolerance", self.frequency_tolerance),
            ("prim_time_tolerance_min", self.prim_time_tolerance_min),
            ("rise_threshold", self.rise_threshold),
            ("max_time_tolerance_min", self.max_time_tolerance_min),
            ("frequency_threshold", self.frequency_threshold),
            ("min_occurrence_fraction", self.min_occurrence_fraction),
            ("peak_window_s", self.peak_window_s),
            ("end_window_s", self.end_window_s),
            ("max_rise_duration_min", self.max_rise_duration_min),
            ("threshold_growth_step_s", self.threshold_growth_step_s),
            ("gap_shift_lookback_s", self.gap_shift_lookback_s),
            ("gap_shift_min_gap_s", self.gap_shift_min_gap_s),
            ("assigner_prune_interval_min", self.assigner_prune_interval_min),
        ];
        for (name, value) in positives {
            if value <= 0.0 || !value.is_finite() {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.plateau_tolerance_hz < 0.0 || !self.plateau_tolerance_hz.is_finite() {
            return Err(Error::Config(format!(
                "plateau_tolerance_hz must be non-negative, got {}",
                self.plateau_tolerance_hz
            )));
        }
        if self.merge_alpha < 0.0 || !self.merge_alpha.is_finite() {
            return Err(Error::Config(format!(
                "merge_alpha must be non-negative, got {}",
                self.merge_alpha
            )));
        }
        if self.min_occurrence_fraction > 1.0 {
            return Err(Error::Config(format!(
                "min_occurrence_fraction must not exceed 1.0, got {}",
                self.min_occurrence_fraction
            )));
        }
        if self.min_trajectory_samples == 0 {
            return Err(Error::Config(
                "min_trajectory_samples must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Load a configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrackerConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("parse {} failed: {}", path.display(), e)))?;
        config.validate()?;
        debug!("loaded tracker configuration from {}", path.display());
        Ok(config)
    }

    /// Write the default configuration as a TOML template.
    pub fn write_template(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&TrackerConfig::default())
            .map_err(|e| Error::Internal(format!("serialize config failed: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
