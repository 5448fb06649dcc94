//! AnalysisResult and match record - pipeline output
//!
//! The result is attached to the match record by the record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Entity, MatchId, PlayerSlot};

/// Derived analytics for one match
///
/// JSON shape: `{ distances, avgSpeeds, maxSpeeds, heatmap }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Total distance per entity (court units)
    pub distances: BTreeMap<Entity, f64>,

    /// Distance over the ball-derived match duration (units/s).
    ///
    /// Kept at full `f64` precision, not rounded to two decimals; round
    /// when displaying.
    pub avg_speeds: BTreeMap<Entity, f64>,

    /// Max of 1-second window means of capped speed (units/s)
    pub max_speeds: BTreeMap<Entity, f64>,

    /// Occupancy grid per player slot
    pub heatmap: Heatmap,
}

/// Occupancy heatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    /// Cell edge length in court units
    pub cell_size: f64,

    /// Visited cells per slot, in first-visit order
    pub heatmap: BTreeMap<PlayerSlot, Vec<HeatmapCell>>,
}

impl Heatmap {
    /// Total visits recorded for a slot
    pub fn total_visits(&self, slot: PlayerSlot) -> u64 {
        self.heatmap
            .get(&slot)
            .map(|cells| cells.iter().map(|c| c.value).sum())
            .unwrap_or(0)
    }
}

/// One visited grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub row: i64,
    pub col: i64,
    /// Visit count
    pub value: u64,
}

/// Match analysis status
///
/// `pending -> analyzing -> analyzed`, or `analyzing -> failed`.
/// Any status may re-enter `analyzing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Analyzing,
    Analyzed,
    Failed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Analyzed => "analyzed",
            Self::Failed => "failed",
        }
    }

    /// Whether the state machine allows `self -> next`
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        match next {
            MatchStatus::Pending => false,
            MatchStatus::Analyzing => true,
            MatchStatus::Analyzed | MatchStatus::Failed => *self == MatchStatus::Analyzing,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match record as held by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub status: MatchStatus,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    /// Last orchestration error, set with `failed`
    #[serde(default)]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            status: MatchStatus::Pending,
            analysis: None,
            error: None,
            updated_at: Utc::now(),
        }
    }
}
