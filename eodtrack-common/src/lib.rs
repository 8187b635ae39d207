//! # eodtrack Common Library
//!
//! Shared code for the eodtrack workspace including:
//! - Error types
//! - Time axis handling and step conversions
//! - Trajectory and rise data model
//! - Tracker configuration loading

pub mod config;
pub mod error;
pub mod time;
pub mod trajectory;

pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use time::TimeAxis;
pub use trajectory::{Rise, Trajectory, TrajectoryId, TrajectorySet};
