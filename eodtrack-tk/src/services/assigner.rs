//! First-level candidate sorting
//!
//! Online greedy assignment of per-timestep candidate frequencies to
//! trajectories. Each candidate is compared against the last observed
//! frequency of every trajectory still eligible for matching; the closest
//! match within the frequency tolerance wins, with ties resolved in favor of
//! the trajectory that has been absent for the shortest time. Candidates
//! without a match open a new trajectory.
//!
//! Trajectories absent longer than the primary time tolerance transition to
//! a forgotten state and are never matched again; there is no numeric
//! sentinel that a real frequency could collide with. Short-lived
//! trajectories are pruned periodically to bound memory over multi-day
//! recordings.
//!
//! Complexity is O(T * F * L) for T timesteps, F candidates per step and L
//! live trajectories, which is acceptable for offline batch use.

use eodtrack_common::{Error, Result, TimeAxis, TrackerConfig, Trajectory, TrajectoryId, TrajectorySet};
use tracing::debug;

/// Matching eligibility of a live trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LastSeen {
    /// Last measured frequency; eligible for matching
    Observed(f64),
    /// Absent beyond the primary time tolerance; never matched again
    Forgotten,
}

/// Assigner bookkeeping for one trajectory.
#[derive(Debug)]
struct ActiveTrajectory {
    id: TrajectoryId,
    last_seen: LastSeen,
    /// Consecutive steps without an assigned candidate
    absent_steps: usize,
}

/// Online greedy assigner, the first-level sorting stage.
///
/// Candidates are pushed one timestep at a time, so stopping early between
/// timesteps leaves a valid trajectory set covering the completed prefix.
pub struct TrajectoryAssigner {
    set: TrajectorySet,
    active: Vec<ActiveTrajectory>,
    axis_len: usize,
    /// Next timestep index to fill
    step: usize,
    frequency_tolerance: f64,
    /// Absence steps after which a trajectory is forgotten
    forget_after_steps: f64,
    prune_interval_steps: usize,
    next_prune_step: usize,
    min_samples: usize,
}

impl TrajectoryAssigner {
    pub fn new(axis: &TimeAxis, config: &TrackerConfig) -> Self {
        let prune_interval_steps =
            (axis.minutes_to_steps(config.assigner_prune_interval_min) as usize).max(1);
        Self {
            set: TrajectorySet::new(),
            active: Vec::new(),
            axis_len: axis.len(),
            step: 0,
            frequency_tolerance: config.frequency_tolerance,
            forget_after_steps: axis.minutes_to_steps(config.prim_time_tolerance_min),
            prune_interval_steps,
            next_prune_step: prune_interval_steps,
            min_samples: config.min_trajectory_samples,
        }
    }

    /// Number of timesteps consumed so far.
    pub fn steps_done(&self) -> usize {
        self.step
    }

    /// Consume the candidate set of the next timestep.
    pub fn push_step(&mut self, candidates: &[f64]) -> Result<()> {
        if self.step >= self.axis_len {
            return Err(Error::InvalidInput(format!(
                "more candidate sets than timesteps ({})",
                self.axis_len
            )));
        }

        if self.step == self.next_prune_step {
            self.prune_short_lived();
            self.next_prune_step += self.prune_interval_steps;
        }

        for &freq in candidates {
            match self.best_match(freq) {
                Some(pos) => {
                    let entry = &mut self.active[pos];
                    entry.last_seen = LastSeen::Observed(freq);
                    entry.absent_steps = 0;
                    let id = entry.id;
                    if let Some(trajectory) = self.set.get_mut(id) {
                        trajectory.set(self.step, freq);
                    }
                }
                None => {
                    let mut trajectory = Trajectory::new_absent(self.axis_len);
                    trajectory.set(self.step, freq);
                    let id = self.set.insert(trajectory);
                    self.active.push(ActiveTrajectory {
                        id,
                        last_seen: LastSeen::Observed(freq),
                        absent_steps: 0,
                    });
                }
            }
        }

        // Absence bookkeeping for trajectories that got nothing this step.
        for entry in self.active.iter_mut() {
            if entry.absent_steps as f64 >= self.forget_after_steps {
                entry.last_seen = LastSeen::Forgotten;
            }
            let unassigned = self
                .set
                .get(entry.id)
                .map(|t| t.get(self.step).is_none())
                .unwrap_or(false);
            if unassigned {
                entry.absent_steps += 1;
            }
        }

        self.step += 1;
        Ok(())
    }

    /// Final cleanup pass; returns the trajectory set.
    pub fn finish(mut self) -> TrajectorySet {
        self.prune_short_lived();
        self.set
    }

    /// Index into `active` of the best matching trajectory for `freq`:
    /// observed state, within tolerance, slot at the current step still
    /// free, smallest absence counter, then smallest frequency difference.
    fn best_match(&self, freq: f64) -> Option<usize> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (pos, entry) in self.active.iter().enumerate() {
            let last_freq = match entry.last_seen {
                LastSeen::Observed(f) => f,
                LastSeen::Forgotten => continue,
            };
            let diff = (last_freq - freq).abs();
            if diff >= self.frequency_tolerance {
                continue;
            }
            let slot_free = self
                .set
                .get(entry.id)
                .map(|t| t.get(self.step).is_none())
                .unwrap_or(false);
            if !slot_free {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_absent, best_diff)) => {
                    entry.absent_steps < best_absent
                        || (entry.absent_steps == best_absent && diff < best_diff)
                }
            };
            if better {
                best = Some((pos, entry.absent_steps, diff));
            }
        }
        best.map(|(pos, _, _)| pos)
    }

    /// Drop trajectories with too few valid samples so far.
    fn prune_short_lived(&mut self) {
        let min_samples = self.min_samples;
        let set = &mut self.set;
        let before = self.active.len();
        self.active.retain(|entry| {
            let keep = set
                .get(entry.id)
                .map(|t| t.valid_count() >= min_samples)
                .unwrap_or(false);
            if !keep {
                set.remove(entry.id);
            }
            keep
        });
        if before != self.active.len() {
            debug!(
                "pruned {} short-lived trajectories at step {}",
                before - self.active.len(),
                self.step
            );
        }
    }
}
