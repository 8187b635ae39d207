//! Artifact persistence
//!
//! Three independently loadable JSON artifacts per recording name:
//! `<name>-times.json`, `<name>-trajectories.json` and `<name>-rises.json`.
//! The first-level assignment is saved under the plain recording name so a
//! later run can resume from it without repeating extraction and
//! assignment; the end result is saved under `<name>-final`.

use crate::workflow::pipeline::TrackingResult;
use chrono::Utc;
use eodtrack_common::{Error, Result, Rise, TimeAxis, Trajectory, TrajectorySet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
struct TimesArtifact {
    recording: String,
    saved_at: String,
    times: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrajectoriesArtifact {
    recording: String,
    saved_at: String,
    /// One sample row per trajectory; null marks an absent slot
    trajectories: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RisesArtifact {
    recording: String,
    saved_at: String,
    /// Rise lists parallel to the trajectory artifact rows
    rises: Vec<Vec<Rise>>,
}

/// Reads and writes the per-recording artifacts in one output folder.
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn artifact_path(&self, name: &str, artifact: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.json", name, artifact))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Err(Error::NotFound(format!("artifact {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_time_axis(&self, name: &str, axis: &TimeAxis) -> Result<PathBuf> {
        let path = self.artifact_path(name, "times");
        self.write_json(
            &path,
            &TimesArtifact {
                recording: name.to_string(),
                saved_at: Utc::now().to_rfc3339(),
                times: axis.times().to_vec(),
            },
        )?;
        Ok(path)
    }

    /// Load and re-validate a persisted time axis.
    pub fn load_time_axis(&self, name: &str) -> Result<TimeAxis> {
        let artifact: TimesArtifact = self.read_json(&self.artifact_path(name, "times"))?;
        TimeAxis::new(artifact.times)
    }

    pub fn save_trajectories(&self, name: &str, set: &TrajectorySet) -> Result<PathBuf> {
        let path = self.artifact_path(name, "trajectories");
        self.write_json(
            &path,
            &TrajectoriesArtifact {
                recording: name.to_string(),
                saved_at: Utc::now().to_rfc3339(),
                trajectories: set.iter().map(|(_, t)| t.samples().to_vec()).collect(),
            },
        )?;
        Ok(path)
    }

    /// Load a persisted trajectory table, without rises.
    pub fn load_trajectories(&self, name: &str) -> Result<TrajectorySet> {
        let artifact: TrajectoriesArtifact =
            self.read_json(&self.artifact_path(name, "trajectories"))?;

        let mut set = TrajectorySet::new();
        let mut len = None;
        for samples in artifact.trajectories {
            match len {
                None => len = Some(samples.len()),
                Some(expected) if expected != samples.len() => {
                    return Err(Error::InvalidInput(format!(
                        "trajectory rows of {} differ in length ({} vs {})",
                        name,
                        samples.len(),
                        expected
                    )));
                }
                _ => {}
            }
            set.insert(Trajectory::from_parts(samples, Vec::new()));
        }
        Ok(set)
    }

    pub fn save_rises(&self, name: &str, set: &TrajectorySet) -> Result<PathBuf> {
        let path = self.artifact_path(name, "rises");
        self.write_json(
            &path,
            &RisesArtifact {
                recording: name.to_string(),
                saved_at: Utc::now().to_rfc3339(),
                rises: set.iter().map(|(_, t)| t.rises().to_vec()).collect(),
            },
        )?;
        Ok(path)
    }

    pub fn load_rises(&self, name: &str) -> Result<Vec<Vec<Rise>>> {
        let artifact: RisesArtifact = self.read_json(&self.artifact_path(name, "rises"))?;
        Ok(artifact.rises)
    }

    /// Persist the first-level assignment for later resumption.
    pub fn save_first_level(
        &self,
        name: &str,
        axis: &TimeAxis,
        set: &TrajectorySet,
    ) -> Result<()> {
        self.save_time_axis(name, axis)?;
        self.save_trajectories(name, set)?;
        info!("saved first-level assignment for {}", name);
        Ok(())
    }

    pub fn load_first_level(&self, name: &str) -> Result<(TimeAxis, TrajectorySet)> {
        let axis = self.load_time_axis(name)?;
        let set = self.load_trajectories(name)?;
        Ok((axis, set))
    }

    /// Persist the final tracking result under `<name>-final`.
    pub fn save_result(&self, name: &str, result: &TrackingResult) -> Result<()> {
        let final_name = format!("{}-final", name);
        self.save_time_axis(&final_name, &result.axis)?;
        self.save_trajectories(&final_name, &result.trajectories)?;
        self.save_rises(&final_name, &result.trajectories)?;
        info!("saved final result for {}", name);
        Ok(())
    }

    pub fn load_result(&self, name: &str) -> Result<TrackingResult> {
        let final_name = format!("{}-final", name);
        let axis = self.load_time_axis(&final_name)?;
        let mut set = self.load_trajectories(&final_name)?;
        let rises = self.load_rises(&final_name)?;

        let ids = set.ids();
        if ids.len() != rises.len() {
            return Err(Error::InvalidInput(format!(
                "{} rise lists for {} trajectories in {}",
                rises.len(),
                ids.len(),
                name
            )));
        }
        for (id, rise_list) in ids.into_iter().zip(rises) {
            if let Some(trajectory) = set.get_mut(id) {
                trajectory.set_rises(rise_list);
            }
        }

        Ok(TrackingResult {
            axis,
            trajectories: set,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_axis() -> TimeAxis {
        TimeAxis::new((0..50).map(|i| i as f64 * 0.5).collect()).unwrap()
    }

    fn sample_set() -> TrajectorySet {
        let mut set = TrajectorySet::new();
        let mut a = Trajectory::new_absent(50);
        for i in 0..30 {
            a.set(i, 500.0 + i as f64 * 0.01);
        }
        set.insert(a);
        let mut b = Trajectory::new_absent(50);
        for i in 20..50 {
            b.set(i, 612.5);
        }
        b.push_rise(Rise::new(20, 35, 620.0, 612.5));
        set.insert(b);
        set
    }

    #[test]
    fn test_time_axis_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path());
        let axis = sample_axis();

        store.save_time_axis("rec1", &axis).unwrap();
        let loaded = store.load_time_axis("rec1").unwrap();
        assert_eq!(loaded, axis);
    }

    #[test]
    fn test_first_level_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path());
        let axis = sample_axis();
        let set = sample_set();

        store.save_first_level("rec1", &axis, &set).unwrap();
        let (loaded_axis, loaded_set) = store.load_first_level("rec1").unwrap();

        assert_eq!(loaded_axis, axis);
        assert_eq!(loaded_set.len(), set.len());
        for ((_, original), (_, loaded)) in set.iter().zip(loaded_set.iter()) {
            assert_eq!(original.samples(), loaded.samples());
            // first-level artifacts carry no rises
            assert!(loaded.rises().is_empty());
        }
    }

    #[test]
    fn test_result_round_trip_keeps_rises() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path());
        let result = TrackingResult {
            axis: sample_axis(),
            trajectories: sample_set(),
        };

        store.save_result("rec1", &result).unwrap();
        let loaded = store.load_result("rec1").unwrap();

        assert_eq!(loaded.trajectories.len(), 2);
        assert_eq!(loaded.total_rises(), 1);
        let with_rise = loaded
            .trajectories
            .iter()
            .find(|(_, t)| !t.rises().is_empty())
            .unwrap()
            .1;
        assert_eq!(with_rise.rises()[0], Rise::new(20, 35, 620.0, 612.5));
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path());
        match store.load_time_axis("absent") {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }
}
