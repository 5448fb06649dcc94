//! Payload parsing and pre-write summary

use contracts::{ContractError, TrackingPayload, TrackingRun};
use serde::Serialize;
use tracing::debug;

/// Parse the vision service JSON body into a validated run.
///
/// # Errors
/// `PayloadParse` for malformed JSON, `PayloadInvalid` for a missing or
/// unusable `fps`/`frames`. Nothing is written in either case.
pub fn parse_payload(body: &str) -> Result<TrackingRun, ContractError> {
    let payload: TrackingPayload =
        serde_json::from_str(body).map_err(|e| ContractError::PayloadParse {
            message: e.to_string(),
        })?;
    let run = TrackingRun::try_from(payload)?;
    debug!(frames = run.len(), fps = run.fps(), "payload parsed");
    Ok(run)
}

/// What a run would write, without writing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSummary {
    pub frames: usize,
    pub fps: f64,
    /// Synthetic time from first to last frame
    pub span_ms: i64,
    pub player_samples: usize,
    pub ball_samples: usize,
    /// Field units the writer would report (2 per player, 3 per ball)
    pub expected_units: u64,
}

impl PayloadSummary {
    pub fn from_run(run: &TrackingRun) -> Self {
        let (player_samples, ball_samples) = run.detected_samples();
        Self {
            frames: run.len(),
            fps: run.fps(),
            span_ms: run.span_ms(),
            player_samples,
            ball_samples,
            expected_units: 2 * player_samples as u64 + 3 * ball_samples as u64,
        }
    }
}
