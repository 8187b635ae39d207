//! Error types for eodtrack-tk

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The occurrence filter removed every trajectory. The caller may relax
    /// the tunables and retry; proceeding on an empty set is never silent.
    #[error("all trajectories fell below the minimum occurrence threshold; relax the tunables and retry")]
    AllTrajectoriesExcluded,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// eodtrack-common error
    #[error(transparent)]
    Common(#[from] eodtrack_common::Error),
}
