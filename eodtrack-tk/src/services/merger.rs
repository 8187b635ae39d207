//! Fragment merging
//!
//! Splitting at rises and gaps in the candidate stream leave one physical
//! fish spread over several trajectory fragments. The merger compares every
//! fragment against the fragments that started earlier, records the
//! cheapest plausible partner per fragment, and greedily collapses the
//! globally cheapest pairs first.
//!
//! Two fragments are comparable when the later one starts inside the
//! earlier one's active span or follows it within the time tolerance. When
//! the later fragment begins with a rise, its settled post-excursion
//! frequency is compared instead of the raw first sample. The cost is the
//! frequency difference plus a small time penalty, so frequency stays
//! dominant. Fragments observed simultaneously in more than a handful of
//! samples are different fish and never merge.

use eodtrack_common::{TimeAxis, TrackerConfig, TrajectoryId, TrajectorySet};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;

/// One candidate merge of `source` (later) into `target` (earlier).
#[derive(Debug, Clone, Copy, PartialEq)]
struct MergeCandidate {
    cost: f64,
    source: TrajectoryId,
    target: TrajectoryId,
}

impl Eq for MergeCandidate {}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.source.cmp(&other.source))
            .then(self.target.cmp(&other.target))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Greedy lowest-cost-first fragment merger.
pub struct TrajectoryMerger {
    max_time_steps: f64,
    frequency_threshold: f64,
    overlap_cap: usize,
    alpha: f64,
    minutes_per_step: f64,
}

impl TrajectoryMerger {
    pub fn new(axis: &TimeAxis, config: &TrackerConfig) -> Self {
        Self {
            max_time_steps: axis.minutes_to_steps(config.max_time_tolerance_min),
            frequency_threshold: config.frequency_threshold,
            overlap_cap: config.merge_overlap_cap,
            alpha: config.merge_alpha,
            minutes_per_step: axis.delta() / 60.0,
        }
    }

    /// Collapse fragments in place; empty trajectories are dropped.
    pub fn merge(&self, set: &mut TrajectorySet) {
        let mut rows = self.build_rows(set);
        let mut heap: BinaryHeap<Reverse<MergeCandidate>> = rows
            .iter()
            .map(|(&source, &(target, cost))| Reverse(MergeCandidate { cost, source, target }))
            .collect();
        let mut merges = 0;

        // Lazily invalidated min-heap: stale entries are skipped when the
        // row no longer matches what was pushed.
        while let Some(Reverse(candidate)) = heap.pop() {
            match rows.get(&candidate.source) {
                Some(&(target, cost)) if target == candidate.target && cost == candidate.cost => {}
                _ => continue,
            }
            rows.remove(&candidate.source);

            let (source, target) = (candidate.source, candidate.target);
            let overlap = match (set.get(source), set.get(target)) {
                (Some(a), Some(b)) => a.overlap_count(b),
                _ => continue,
            };
            if overlap > self.overlap_cap {
                // earlier merges made the pair overlap too much
                continue;
            }

            let Some((a, b)) = set.pair_mut(source, target) else {
                continue;
            };
            b.absorb(a);
            a.clear_all();
            for rise in a.take_rises() {
                b.push_rise(rise);
            }
            merges += 1;

            // rows that pointed at the absorbed fragment now point at its target
            for (&other, entry) in rows.iter_mut() {
                if entry.0 == source {
                    entry.0 = target;
                    heap.push(Reverse(MergeCandidate {
                        cost: entry.1,
                        source: other,
                        target,
                    }));
                }
            }
        }

        let mut dropped = 0;
        for id in set.ids() {
            if set.get(id).map(|t| t.is_fully_absent()).unwrap_or(false) {
                set.remove(id);
                dropped += 1;
            }
        }

        debug!("merged {} fragment pairs, dropped {} emptied trajectories", merges, dropped);
    }

    /// Cheapest plausible partner per fragment, scanning from the most
    /// recent fragment backwards over everything that started earlier.
    fn build_rows(&self, set: &TrajectorySet) -> HashMap<TrajectoryId, (TrajectoryId, f64)> {
        let mut order: Vec<(usize, TrajectoryId)> = set
            .iter()
            .filter_map(|(id, t)| t.first_valid_index().map(|first| (first, id)))
            .collect();
        order.sort_unstable();

        let mut rows = HashMap::new();
        for a_pos in (0..order.len()).rev() {
            let a_id = order[a_pos].1;
            let mut best: Option<(TrajectoryId, f64)> = None;
            for b_pos in (0..a_pos).rev() {
                let b_id = order[b_pos].1;
                if let Some(cost) = self.pair_cost(set, a_id, b_id) {
                    if best.map(|(_, c)| cost < c).unwrap_or(true) {
                        best = Some((b_id, cost));
                    }
                }
            }
            if let Some(entry) = best {
                rows.insert(a_id, entry);
            }
        }
        rows
    }

    /// Combination cost of merging `a` (later) into `b` (earlier), or None
    /// when the pair is not combinable.
    fn pair_cost(
        &self,
        set: &TrajectorySet,
        a_id: TrajectoryId,
        b_id: TrajectoryId,
    ) -> Option<f64> {
        let a = set.get(a_id)?;
        let b = set.get(b_id)?;
        let a_first = a.first_valid_index()?;
        let b_first = b.first_valid_index()?;
        let b_last = b.last_valid_index()?;

        // compare the settled frequency after an onset rise, not its peak
        let (a_idx, a_freq) = match a.rise_at_onset() {
            Some(rise) => (rise.end_index, a.get(rise.end_index)?),
            None => (a_first, a.get(a_first)?),
        };

        let b_idx = if a_first > b_first && a_first < b_last {
            b.last_valid_before(a_idx)?
        } else if a_first > b_last && ((a_first - b_last) as f64) <= self.max_time_steps {
            b_last
        } else {
            return None;
        };
        let b_freq = b.get(b_idx)?;

        let freq_diff = (a_freq - b_freq).abs();
        if freq_diff > self.frequency_threshold {
            return None;
        }
        if a.overlap_count(b) > self.overlap_cap {
            return None;
        }

        let steps = a_idx.abs_diff(b_idx);
        Some(freq_diff + self.alpha * steps as f64 * self.minutes_per_step)
    }
}
