//! Minimum-occurrence filtering
//!
//! Drops trajectories that cover too little of the recording to be a real
//! fish. The threshold scales with the recording duration and is capped at
//! one minute of valid samples. Applying the filter twice is a no-op.

use eodtrack_common::{TimeAxis, TrackerConfig, TrajectorySet};
use tracing::debug;

/// Remove trajectories with fewer valid samples than the minimum-occurrence
/// threshold. Returns the number of removed trajectories.
pub fn exclude_short(
    set: &mut TrajectorySet,
    axis: &TimeAxis,
    config: &TrackerConfig,
) -> usize {
    let minutes = (config.min_occurrence_fraction * axis.duration_minutes()).min(1.0);
    let min_steps = axis.minutes_to_steps(minutes).max(1.0);

    let mut removed = 0;
    for id in set.ids() {
        let count = set.get(id).map(|t| t.valid_count()).unwrap_or(0);
        if (count as f64) < min_steps {
            set.remove(id);
            removed += 1;
        }
    }

    if removed > 0 {
        debug!(
            "occurrence filter removed {} trajectories below {:.1} steps",
            removed, min_steps
        );
    }
    removed
}
