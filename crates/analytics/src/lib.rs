//! # Analytics
//!
//! Match aggregates derived from stored tracking points.
//!
//! Responsibilities:
//! - Rebuild per-entity trajectories from store rows
//! - Distance and average speed (`MotionAggregator`)
//! - Windowed, capped maximum speed (`PeakSpeedEstimator`)
//! - Per-slot occupancy grid (`HeatmapBuilder`)
//!
//! All three read through `TimeSeriesQuery` and compute in-process, so any
//! store that can return raw samples is enough.

mod error;
mod heatmap;
mod motion;
mod peak;
mod trajectory;

pub use error::{AnalyticsError, Result};
pub use heatmap::{build_heatmap, HeatmapBuilder};
pub use motion::{
    match_duration_secs, path_length, summarize_motion, MotionAggregator, MotionSummary,
};
pub use peak::{
    instantaneous_speeds, max_window_mean, peak_speed, peak_speeds, PeakSpeedEstimator,
    SpeedLimits,
};
pub use trajectory::{group_trajectories, load_trajectories};
