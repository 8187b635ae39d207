//! Splitting trajectories at rise starts
//!
//! A rise usually marks the point where the greedy first-level sorting
//! attached samples of the wrong fish, so every detected rise cuts its
//! trajectory in two: the suffix from the rise start onward becomes a new
//! fragment and takes the rise record with it. Rises are processed in
//! reverse index order so earlier cut points stay valid while the
//! trajectory is mutated. Fragments left with too few samples are pruned
//! together with their rises.

use eodtrack_common::{TrackerConfig, TrajectorySet};
use tracing::debug;

/// Cut every trajectory at its rise starts and prune short fragments.
pub fn split_at_rises(set: &mut TrajectorySet, config: &TrackerConfig) {
    let before = set.len();

    for id in set.ids() {
        let fragments = {
            let trajectory = match set.get_mut(id) {
                Some(t) => t,
                None => continue,
            };
            let mut rises = trajectory.take_rises();
            rises.sort_by_key(|r| r.start_index);

            let mut fragments = Vec::with_capacity(rises.len());
            for rise in rises.into_iter().rev() {
                let mut fragment = trajectory.split_off_suffix(rise.start_index);
                fragment.push_rise(rise);
                fragments.push(fragment);
            }
            fragments
        };
        for fragment in fragments {
            set.insert(fragment);
        }
    }

    let mut pruned = 0;
    for id in set.ids() {
        let count = set.get(id).map(|t| t.valid_count()).unwrap_or(0);
        if count < config.min_trajectory_samples {
            set.remove(id);
            pruned += 1;
        }
    }

    debug!(
        "split {} trajectories into {} fragments ({} pruned)",
        before,
        set.len(),
        pruned
    );
}
