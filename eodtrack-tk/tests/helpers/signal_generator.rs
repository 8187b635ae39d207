//! Synthetic candidate stream generator
//!
//! Builds idealized per-fish frequency traces and merges them into the
//! per-timestep candidate sets the spectral front-end would hand over:
//! constant baselines, sharp excursions, double-exponential rises, silent
//! gaps and optional measurement jitter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform time axis starting at zero.
pub fn uniform_times(n: usize, delta: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * delta).collect()
}

/// Constant-frequency trace.
pub fn constant_trace(freq: f64, n: usize) -> Vec<Option<f64>> {
    vec![Some(freq); n]
}

/// Baseline, linear jump to `baseline + size`, linear decay back, trailing
/// baseline. Counts are in steps; the peak sits at index
/// `n_baseline + n_rise - 1`.
pub fn sharp_rise_trace(
    baseline: f64,
    size: f64,
    n_baseline: usize,
    n_rise: usize,
    n_decay: usize,
    n_tail: usize,
) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(n_baseline + n_rise + n_decay + n_tail);
    for _ in 0..n_baseline {
        values.push(Some(baseline));
    }
    for k in 1..=n_rise {
        values.push(Some(baseline + size * k as f64 / n_rise as f64));
    }
    for k in 1..=n_decay {
        values.push(Some(baseline + size - size * k as f64 / n_decay as f64));
    }
    for _ in 0..n_tail {
        values.push(Some(baseline));
    }
    values
}

/// Constant baseline with a double-exponential rise from `onset`:
/// `size * (1 - e^(-t/tau_rise)) * e^(-t/tau_decay)`.
pub fn trace_with_rise(
    baseline: f64,
    n: usize,
    delta: f64,
    onset: usize,
    size: f64,
    tau_rise: f64,
    tau_decay: f64,
) -> Vec<Option<f64>> {
    (0..n)
        .map(|i| {
            let mut freq = baseline;
            if i >= onset {
                let t = (i - onset) as f64 * delta;
                freq += size * (1.0 - (-t / tau_rise).exp()) * (-t / tau_decay).exp();
            }
            Some(freq)
        })
        .collect()
}

/// Silence a trace over `[from, to)`.
pub fn with_gap(mut trace: Vec<Option<f64>>, from: usize, to: usize) -> Vec<Option<f64>> {
    for slot in trace.iter_mut().take(to).skip(from) {
        *slot = None;
    }
    trace
}

/// Add deterministic measurement jitter.
pub fn with_jitter(trace: Vec<Option<f64>>, amplitude: f64, seed: u64) -> Vec<Option<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    trace
        .into_iter()
        .map(|slot| slot.map(|freq| freq + rng.gen_range(-amplitude..amplitude)))
        .collect()
}

/// Merge per-fish traces into per-timestep candidate sets.
pub fn to_candidates(traces: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
    let n = traces.iter().map(|t| t.len()).max().unwrap_or(0);
    (0..n)
        .map(|i| {
            traces
                .iter()
                .filter_map(|trace| trace.get(i).copied().flatten())
                .collect()
        })
        .collect()
}
