//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the pipeline:
//! the inbound tracking payload, persisted points, reconstructed
//! trajectories, the analysis result, configuration, and the store traits.
//! Business crates depend on this crate only; reverse dependencies are
//! prohibited.
//!
//! ## Time Model
//! - Points carry Unix epoch milliseconds
//! - Frame timestamps are synthetic: a fixed lookback before ingestion time
//!   plus `index * 1000 / fps`

mod analysis;
mod config;
mod entity;
mod error;
mod match_id;
mod payload;
mod point;
mod records;
mod store;
mod trajectory;

pub use analysis::*;
pub use config::*;
pub use entity::*;
pub use error::*;
pub use match_id::MatchId;
pub use payload::*;
pub use point::*;
pub use records::{LocalMatchRecordStore, MatchRecordStore};
pub use store::*;
pub use trajectory::*;
