//! PeakSpeedEstimator - windowed, capped maximum speed
//!
//! Per entity: instantaneous speed for each step (stamped at the later
//! sample), ball speeds above the discard threshold dropped, the rest
//! capped, then averaged in fixed epoch-aligned windows. The result is the
//! largest window mean, never the largest raw sample.

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{AnalyticsConfig, Entity, EntityKind, EntityTrajectory, MatchId, TimeSeriesQuery};
use tracing::{info, instrument};

use crate::error::Result;
use crate::trajectory::load_trajectories;

/// Cap and discard thresholds for one entity kind (units/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    pub cap: f64,
    /// Samples above this are dropped before capping
    pub discard_above: Option<f64>,
}

impl SpeedLimits {
    pub fn player(config: &AnalyticsConfig) -> Self {
        Self {
            cap: config.player_speed_cap,
            discard_above: None,
        }
    }

    pub fn ball(config: &AnalyticsConfig) -> Self {
        Self {
            cap: config.ball_speed_cap,
            discard_above: Some(config.ball_speed_discard),
        }
    }

    /// Capped speed, or `None` for a discarded sample
    pub fn apply(&self, speed: f64) -> Option<f64> {
        match self.discard_above {
            Some(limit) if speed > limit => None,
            _ => Some(speed.min(self.cap)),
        }
    }
}

/// `(timestamp_ms, units/s)` for every step; 0 when no time elapsed
pub fn instantaneous_speeds(trajectory: &EntityTrajectory) -> Vec<(i64, f64)> {
    trajectory
        .steps()
        .map(|(prev, next)| {
            let elapsed_ms = next.timestamp_ms - prev.timestamp_ms;
            let speed = if elapsed_ms > 0 {
                prev.distance_to(next) / (elapsed_ms as f64 / 1000.0)
            } else {
                0.0
            };
            (next.timestamp_ms, speed)
        })
        .collect()
}

/// Largest per-window mean; 0 when there are no samples
pub fn max_window_mean(speeds: impl IntoIterator<Item = (i64, f64)>, window_ms: i64) -> f64 {
    let mut windows: BTreeMap<i64, (f64, u32)> = BTreeMap::new();
    for (timestamp_ms, speed) in speeds {
        let slot = windows
            .entry(timestamp_ms.div_euclid(window_ms))
            .or_insert((0.0, 0));
        slot.0 += speed;
        slot.1 += 1;
    }
    windows
        .values()
        .map(|(sum, count)| sum / f64::from(*count))
        .fold(0.0, f64::max)
}

/// Peak speed of one trajectory
pub fn peak_speed(trajectory: &EntityTrajectory, limits: SpeedLimits, window_ms: i64) -> f64 {
    let capped = instantaneous_speeds(trajectory)
        .into_iter()
        .filter_map(|(t, v)| limits.apply(v).map(|v| (t, v)));
    max_window_mean(capped, window_ms)
}

/// Peak speeds for all players plus the ball (0 without ball samples)
pub fn peak_speeds(
    players: &BTreeMap<Entity, EntityTrajectory>,
    ball: Option<&EntityTrajectory>,
    config: &AnalyticsConfig,
) -> BTreeMap<Entity, f64> {
    let player_limits = SpeedLimits::player(config);
    let mut speeds: BTreeMap<Entity, f64> = players
        .iter()
        .map(|(entity, t)| (*entity, peak_speed(t, player_limits, config.window_ms)))
        .collect();
    let ball_speed =
        ball.map_or(0.0, |t| peak_speed(t, SpeedLimits::ball(config), config.window_ms));
    speeds.insert(Entity::Ball, ball_speed);
    speeds
}

/// Windowed maximum speed for a match
pub struct PeakSpeedEstimator<Q> {
    store: Arc<Q>,
    config: AnalyticsConfig,
}

impl<Q: TimeSeriesQuery> PeakSpeedEstimator<Q> {
    pub fn new(store: Arc<Q>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    #[instrument(name = "peak_speed_compute", skip(self), fields(match_id = %match_id))]
    pub async fn compute(&self, match_id: &MatchId) -> Result<BTreeMap<Entity, f64>> {
        let players = load_trajectories(self.store.as_ref(), match_id, EntityKind::Player).await?;
        let ball = load_trajectories(self.store.as_ref(), match_id, EntityKind::Ball).await?;

        let speeds = peak_speeds(&players, ball.get(&Entity::Ball), &self.config);
        info!(entities = speeds.len(), "peak speeds computed");
        Ok(speeds)
    }
}
