//! # Pipeline
//!
//! Match finalisation: write a tracking run, wait for the store to catch
//! up, derive the analytics and persist them on the match record.
//!
//! ## Usage Example
//!
//! ```ignore
//! use pipeline::AnalyticsOrchestrator;
//!
//! let orchestrator = AnalyticsOrchestrator::new(store, records, config);
//! let outcome = orchestrator.finalize_match(&match_id, &run).await?;
//! outcome.stats.print_summary();
//! ```

mod error;
mod orchestrator;
mod stats;

pub use error::{PipelineError, Result};
pub use orchestrator::{AnalyticsOrchestrator, MatchOutcome};
pub use stats::PipelineStats;
