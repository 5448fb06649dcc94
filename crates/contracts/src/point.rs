//! Point - TimeSeriesWriter output
//!
//! One persisted time-series fact for one entity at one instant.

use serde::{Deserialize, Serialize};

use crate::{Entity, EntityKind, MatchId};

/// Default measurement name for tracking points
pub const MEASUREMENT: &str = "match_tracking";

/// Tag keys
pub const TAG_MATCH_ID: &str = "match_id";
pub const TAG_ENTITY: &str = "entity";
pub const TAG_PLAYER_SLOT: &str = "player_slot";

/// Field keys
pub const FIELD_X: &str = "x";
pub const FIELD_Y: &str = "y";
pub const FIELD_BOUNCE: &str = "bounce";

/// Persisted tracking point
///
/// Tags: `match_id`, `entity`, and `player_slot` for players.
/// Fields: `x`, `y`, and `bounce` for the ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub match_id: MatchId,
    pub entity: Entity,
    pub x: f64,
    pub y: f64,
    /// Ball only; always present on ball points
    pub bounce: Option<i64>,
    /// Unix epoch milliseconds
    pub timestamp_ms: i64,
}

impl Point {
    /// Player position point
    pub fn player(
        match_id: MatchId,
        slot: crate::PlayerSlot,
        x: f64,
        y: f64,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            match_id,
            entity: Entity::Player(slot),
            x,
            y,
            bounce: None,
            timestamp_ms,
        }
    }

    /// Ball position point; a missing bounce counter is written as 0
    pub fn ball(match_id: MatchId, x: f64, y: f64, bounce: Option<i64>, timestamp_ms: i64) -> Self {
        Self {
            match_id,
            entity: Entity::Ball,
            x,
            y,
            bounce: Some(bounce.unwrap_or(0)),
            timestamp_ms,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }

    /// Number of field values this point contributes to a store count.
    ///
    /// Players write x and y (2); the ball writes x, y and bounce (3).
    /// The visibility gate compares against the sum of these.
    pub fn field_count(&self) -> u64 {
        2 + u64::from(self.bounce.is_some())
    }

    /// Tag set in key order
    pub fn tags(&self) -> Vec<(&'static str, &str)> {
        let mut tags = vec![
            (TAG_ENTITY, self.kind().as_str()),
            (TAG_MATCH_ID, self.match_id.as_str()),
        ];
        if let Some(slot) = self.entity.slot() {
            tags.push((TAG_PLAYER_SLOT, slot.as_str()));
        }
        tags
    }
}
