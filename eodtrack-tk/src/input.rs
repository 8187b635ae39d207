//! Extraction boundary input
//!
//! The spectral front-end analyzes the raw recording in fixed-size windows
//! and emits, per analysis step, the set of fundamental frequencies it found.
//! This module defines that handover format and validates it before any
//! pipeline stage runs.

use eodtrack_common::{Error, Result, TimeAxis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-timestep candidate fundamental frequencies with their time axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSeries {
    /// Timestamp of every analysis step in seconds
    pub times: Vec<f64>,
    /// Candidate fundamental frequencies (Hz) per step; may be empty
    pub candidates: Vec<Vec<f64>>,
}

impl CandidateSeries {
    pub fn new(times: Vec<f64>, candidates: Vec<Vec<f64>>) -> Self {
        Self { times, candidates }
    }

    /// Load a candidate series from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let series = serde_json::from_str(&content)?;
        Ok(series)
    }

    /// Total number of candidate readings across all timesteps.
    pub fn total_candidates(&self) -> usize {
        self.candidates.iter().map(|c| c.len()).sum()
    }

    /// Validate the series and build its time axis.
    ///
    /// Fails on a time/candidate length mismatch, a malformed time axis, or
    /// non-finite/non-positive candidate frequencies.
    pub fn time_axis(&self) -> Result<TimeAxis> {
        if self.times.len() != self.candidates.len() {
            return Err(Error::InvalidInput(format!(
                "time axis has {} steps but {} candidate sets were supplied",
                self.times.len(),
                self.candidates.len()
            )));
        }

        for (step, set) in self.candidates.iter().enumerate() {
            for &freq in set {
                if !freq.is_finite() || freq <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "candidate frequency {} at step {} is not a positive number",
                        freq, step
                    )));
                }
            }
        }

        TimeAxis::new(self.times.clone())
    }
}
