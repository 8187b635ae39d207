//! eodtrack-tk library interface
//!
//! Turns per-timestep candidate fundamental-frequency readings from long
//! recordings of wave-type weakly electric fish into per-fish frequency
//! trajectories: greedy online assignment, occurrence filtering, rise
//! detection, splitting at rises, and fragment merging.
//!
//! The spectral front-end that extracts the candidates from raw recordings
//! is a separate tool; this crate starts at its output (a time axis plus one
//! candidate set per timestep) and ends at the final trajectory table.

pub mod error;
pub mod input;
pub mod services;
pub mod workflow;

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::input::CandidateSeries;
pub use crate::workflow::pipeline::{Pipeline, TrackingResult};
pub use crate::workflow::storage::RecordingStore;
