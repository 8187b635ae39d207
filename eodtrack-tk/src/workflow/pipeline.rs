//! Pipeline orchestrator
//!
//! Runs the tracking stages in their fixed order: validate input, assign
//! candidates to trajectories, filter short-lived trajectories, detect
//! rises, split at them, merge fragments. Later stages depend on the
//! complete output of earlier ones, so the sequence never changes.
//!
//! The run can resume from a persisted first-level assignment, skipping
//! extraction and assignment, and supports a cooperative stop check between
//! assignment timesteps: the completed prefix is still a valid trajectory
//! set and flows through the remaining stages.

use crate::error::{PipelineError, PipelineResult};
use crate::input::CandidateSeries;
use crate::services::{assigner::TrajectoryAssigner, merger::TrajectoryMerger, occurrence_filter,
    rise_detector::RiseDetector, splitter};
use eodtrack_common::{Error, TimeAxis, TrackerConfig, TrajectorySet};
use tracing::{debug, info, warn};

/// Final tracking output: the time axis and the merged trajectory set with
/// per-trajectory rise lists.
#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub axis: TimeAxis,
    pub trajectories: TrajectorySet,
}

impl TrackingResult {
    /// Total rise count across all trajectories.
    pub fn total_rises(&self) -> usize {
        self.trajectories.iter().map(|(_, t)| t.rises().len()).sum()
    }
}

/// Sequences the tracking stages over one recording.
pub struct Pipeline {
    config: TrackerConfig,
}

impl Pipeline {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Run the full pipeline on a candidate series.
    pub fn run(&self, series: &CandidateSeries) -> PipelineResult<TrackingResult> {
        self.run_with_stop(series, || false)
    }

    /// Like [`run`](Self::run), but checks `stop` between assignment
    /// timesteps and continues with the completed prefix when it fires.
    pub fn run_with_stop(
        &self,
        series: &CandidateSeries,
        stop: impl Fn() -> bool,
    ) -> PipelineResult<TrackingResult> {
        let (axis, set) = self.first_level_with_stop(series, stop)?;
        self.resume(axis, set)
    }

    /// Assignment only: validate the input and produce the first-level
    /// trajectory set. The result can be persisted and resumed later.
    pub fn first_level(
        &self,
        series: &CandidateSeries,
    ) -> PipelineResult<(TimeAxis, TrajectorySet)> {
        self.first_level_with_stop(series, || false)
    }

    pub fn first_level_with_stop(
        &self,
        series: &CandidateSeries,
        stop: impl Fn() -> bool,
    ) -> PipelineResult<(TimeAxis, TrajectorySet)> {
        self.config.validate()?;
        let axis = series.time_axis()?;

        info!(
            "sorting candidates of {} timesteps ({:.1} min)",
            axis.len(),
            axis.duration_minutes()
        );
        let mut assigner = TrajectoryAssigner::new(&axis, &self.config);
        for candidates in &series.candidates {
            if stop() {
                warn!(
                    "stopping early after {} of {} timesteps",
                    assigner.steps_done(),
                    axis.len()
                );
                break;
            }
            assigner.push_step(candidates)?;
        }
        let set = assigner.finish();
        info!("first-level sorting produced {} trajectories", set.len());

        Ok((axis, set))
    }

    /// Run the stages after assignment on an existing first-level set,
    /// either fresh from the assigner or reloaded from storage.
    pub fn resume(&self, axis: TimeAxis, mut set: TrajectorySet) -> PipelineResult<TrackingResult> {
        self.config.validate()?;
        for (id, trajectory) in set.iter() {
            if trajectory.len() != axis.len() {
                return Err(Error::InvalidInput(format!(
                    "trajectory {} spans {} steps but the time axis has {}",
                    id,
                    trajectory.len(),
                    axis.len()
                ))
                .into());
            }
        }

        let removed = occurrence_filter::exclude_short(&mut set, &axis, &self.config);
        if set.is_empty() {
            return Err(PipelineError::AllTrajectoriesExcluded);
        }
        info!(
            "occurrence filter removed {} trajectories, {} remain",
            removed,
            set.len()
        );

        let detector = RiseDetector::new(&axis, &self.config);
        let mut total_rises = 0;
        for id in set.ids() {
            let rises = match set.get(id) {
                Some(trajectory) => detector.detect(trajectory),
                None => continue,
            };
            if !rises.is_empty() {
                debug!("trajectory {}: {} rises", id, rises.len());
            }
            total_rises += rises.len();
            if let Some(trajectory) = set.get_mut(id) {
                trajectory.set_rises(rises);
            }
        }
        info!("detected {} rises", total_rises);

        splitter::split_at_rises(&mut set, &self.config);
        info!("splitting left {} fragments", set.len());

        TrajectoryMerger::new(&axis, &self.config).merge(&mut set);
        info!("{} trajectories left after merging", set.len());

        Ok(TrackingResult {
            axis,
            trajectories: set,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_series(n: usize, delta: f64, freqs: &[f64]) -> CandidateSeries {
        CandidateSeries::new(
            (0..n).map(|i| i as f64 * delta).collect(),
            (0..n).map(|_| freqs.to_vec()).collect(),
        )
    }

    #[test]
    fn test_invalid_config_fails_before_any_stage() {
        let pipeline = Pipeline::new(TrackerConfig {
            frequency_tolerance: -1.0,
            ..Default::default()
        });
        let series = constant_series(100, 1.0, &[500.0]);
        assert!(pipeline.run(&series).is_err());
    }

    #[test]
    fn test_length_mismatch_fails_before_any_stage() {
        let pipeline = Pipeline::new(TrackerConfig::default());
        let mut series = constant_series(100, 1.0, &[500.0]);
        series.candidates.pop();
        assert!(pipeline.run(&series).is_err());
    }

    #[test]
    fn test_all_filtered_is_an_explicit_outcome() {
        // every candidate stream is too sparse to survive
        let pipeline = Pipeline::new(TrackerConfig::default());
        let mut series = constant_series(6000, 1.0, &[]);
        for step in series.candidates.iter_mut().take(20) {
            step.push(500.0);
        }
        match pipeline.run(&series) {
            Err(PipelineError::AllTrajectoriesExcluded) => {}
            other => panic!("expected AllTrajectoriesExcluded, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_stop_yields_valid_prefix() {
        let pipeline = Pipeline::new(TrackerConfig::default());
        let series = constant_series(600, 1.0, &[500.0]);

        let counter = std::cell::Cell::new(0usize);
        let result = pipeline
            .run_with_stop(&series, || {
                counter.set(counter.get() + 1);
                counter.get() > 300
            })
            .unwrap();

        assert_eq!(result.trajectories.len(), 1);
        let (_, trajectory) = result.trajectories.iter().next().unwrap();
        // full axis length, samples only in the completed prefix
        assert_eq!(trajectory.len(), 600);
        assert_eq!(trajectory.valid_count(), 300);
    }

    #[test]
    fn test_resume_rejects_wrong_length() {
        let pipeline = Pipeline::new(TrackerConfig::default());
        let axis = TimeAxis::new((0..100).map(|i| i as f64).collect()).unwrap();
        let mut set = TrajectorySet::new();
        set.insert(eodtrack_common::Trajectory::new_absent(50));
        assert!(pipeline.resume(axis, set).is_err());
    }
}
