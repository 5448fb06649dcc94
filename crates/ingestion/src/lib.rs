//! # Ingestion
//!
//! Tracking payload ingestion module.
//!
//! Responsibilities:
//! - Parse and validate the vision service payload into a `TrackingRun`
//! - Convert frames into tagged, timestamped `Point`s and persist them
//!   (`TimeSeriesWriter`)
//! - Wait until persisted points are observable (`WriteVisibilityGate`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{parse_payload, TimeSeriesWriter, WriteVisibilityGate};
//!
//! let run = parse_payload(&body)?;
//! let writer = TimeSeriesWriter::new(store.clone(), config.writer.clone());
//! let written = writer.write(&match_id, &run).await;
//!
//! let gate = WriteVisibilityGate::new(store, config.gate.clone());
//! gate.await_visible(&match_id, written).await?;
//! ```

mod error;
mod gate;
mod payload;
mod writer;

pub use error::{IngestionError, Result};
pub use gate::{GateOutcome, WriteVisibilityGate};
pub use payload::{parse_payload, PayloadSummary};
pub use writer::{build_points, TimeSeriesWriter};
