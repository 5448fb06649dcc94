//! MotionAggregator - total distance and average speed per entity
//!
//! Every entity's average speed divides by the same duration: the span of
//! the ball trajectory, first to last sample.

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{AnalyticsConfig, Entity, EntityKind, EntityTrajectory, MatchId, TimeSeriesQuery};
use tracing::{info, instrument};

use crate::error::{AnalyticsError, Result};
use crate::trajectory::load_trajectories;

/// Distances and average speeds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionSummary {
    pub distances: BTreeMap<Entity, f64>,
    pub avg_speeds: BTreeMap<Entity, f64>,
    /// Ball-derived match duration
    pub duration_secs: f64,
}

/// Sum of consecutive step lengths; steps longer than `max_step` are skipped
pub fn path_length(trajectory: &EntityTrajectory, max_step: Option<f64>) -> f64 {
    trajectory
        .steps()
        .map(|(prev, next)| prev.distance_to(next))
        .filter(|step| max_step.is_none_or(|max| *step <= max))
        .sum()
}

/// Seconds from the first to the last ball sample, `None` without samples
pub fn match_duration_secs(ball: Option<&EntityTrajectory>) -> Option<f64> {
    ball.filter(|t| !t.is_empty())
        .map(|t| t.span_ms() as f64 / 1000.0)
}

/// Combine player and ball trajectories into a summary
pub fn summarize_motion(
    match_id: &MatchId,
    players: &BTreeMap<Entity, EntityTrajectory>,
    ball: Option<&EntityTrajectory>,
    ball_step_max: f64,
) -> Result<MotionSummary> {
    let duration_secs =
        match_duration_secs(ball).ok_or_else(|| AnalyticsError::DataMissing {
            match_id: match_id.to_string(),
            message: "no ball samples to derive match duration".into(),
        })?;

    let mut distances: BTreeMap<Entity, f64> = players
        .iter()
        .map(|(entity, trajectory)| (*entity, path_length(trajectory, None)))
        .collect();
    let ball_distance = ball.map_or(0.0, |t| path_length(t, Some(ball_step_max)));
    distances.insert(Entity::Ball, ball_distance);

    let avg_speeds = distances
        .iter()
        .map(|(entity, distance)| {
            let speed = if duration_secs > 0.0 {
                distance / duration_secs
            } else {
                0.0
            };
            (*entity, speed)
        })
        .collect();

    Ok(MotionSummary {
        distances,
        avg_speeds,
        duration_secs,
    })
}

/// Distance and average speed for a match
pub struct MotionAggregator<Q> {
    store: Arc<Q>,
    config: AnalyticsConfig,
}

impl<Q: TimeSeriesQuery> MotionAggregator<Q> {
    pub fn new(store: Arc<Q>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    /// # Errors
    /// `DataMissing` when the match has no ball samples.
    #[instrument(name = "motion_compute", skip(self), fields(match_id = %match_id))]
    pub async fn compute(&self, match_id: &MatchId) -> Result<MotionSummary> {
        let players = load_trajectories(self.store.as_ref(), match_id, EntityKind::Player).await?;
        let ball = load_trajectories(self.store.as_ref(), match_id, EntityKind::Ball).await?;

        let summary = summarize_motion(
            match_id,
            &players,
            ball.get(&Entity::Ball),
            self.config.ball_step_max,
        )?;
        info!(
            entities = summary.distances.len(),
            duration_secs = summary.duration_secs,
            "motion computed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PlayerSlot, Point, Sample, TimeSeriesWrite};
    use tsdb::MemoryStore;

    const TL: Entity = Entity::Player(PlayerSlot::TopLeft);

    fn trajectory(entity: Entity, samples: &[(i64, f64, f64)]) -> EntityTrajectory {
        EntityTrajectory::new(
            entity,
            samples.iter().map(|&(t, x, y)| Sample::new(t, x, y)).collect(),
        )
    }

    #[test]
    fn test_single_step_scenario() {
        let players = BTreeMap::from([(TL, trajectory(TL, &[(0, 0.0, 0.0), (1000, 3.0, 4.0)]))]);
        let ball = trajectory(Entity::Ball, &[(0, 5.0, 5.0), (1000, 5.0, 5.5)]);

        let summary = summarize_motion(&"m".into(), &players, Some(&ball), 1.0).unwrap();
        assert_eq!(summary.distances[&TL], 5.0);
        assert_eq!(summary.avg_speeds[&TL], 5.0);
        assert_eq!(summary.distances[&Entity::Ball], 0.5);
    }

    #[test]
    fn test_ball_spikes_excluded() {
        let ball = trajectory(
            Entity::Ball,
            &[(0, 0.0, 0.0), (40, 0.5, 0.0), (80, 3.5, 0.0), (120, 4.0, 0.0)],
        );
        // 0.5 + (3.0 skipped) + 0.5
        assert_eq!(path_length(&ball, Some(1.0)), 1.0);
        assert_eq!(path_length(&ball, None), 4.0);
    }

    #[test]
    fn test_shared_ball_duration() {
        // player spans 1s, ball spans 2s: player speed uses 2s
        let players = BTreeMap::from([(TL, trajectory(TL, &[(0, 0.0, 0.0), (1000, 0.0, 4.0)]))]);
        let ball = trajectory(Entity::Ball, &[(0, 0.0, 0.0), (2000, 0.0, 0.0)]);
        let summary = summarize_motion(&"m".into(), &players, Some(&ball), 1.0).unwrap();
        assert_eq!(summary.duration_secs, 2.0);
        assert_eq!(summary.avg_speeds[&TL], 2.0);
    }

    #[test]
    fn test_average_speed_is_not_rounded() {
        let players = BTreeMap::from([(TL, trajectory(TL, &[(0, 0.0, 0.0), (3000, 1.0, 0.0)]))]);
        let ball = trajectory(Entity::Ball, &[(0, 0.0, 0.0), (3000, 0.0, 0.0)]);
        let summary = summarize_motion(&"m".into(), &players, Some(&ball), 1.0).unwrap();
        assert_eq!(summary.avg_speeds[&TL], 1.0 / 3.0);
        assert_ne!(summary.avg_speeds[&TL], 0.33);
    }

    #[test]
    fn test_zero_duration_gives_zero_speed() {
        let players = BTreeMap::from([(TL, trajectory(TL, &[(0, 0.0, 0.0), (40, 1.0, 0.0)]))]);
        let ball = trajectory(Entity::Ball, &[(0, 1.0, 1.0)]);
        let summary = summarize_motion(&"m".into(), &players, Some(&ball), 1.0).unwrap();
        assert_eq!(summary.avg_speeds[&TL], 0.0);
        assert_eq!(summary.avg_speeds[&Entity::Ball], 0.0);
    }

    #[test]
    fn test_missing_ball_is_an_error() {
        let err = summarize_motion(&"m".into(), &BTreeMap::new(), None, 1.0).unwrap_err();
        assert!(matches!(err, AnalyticsError::DataMissing { .. }));
    }

    #[tokio::test]
    async fn test_compute_from_store() {
        let store = Arc::new(MemoryStore::new());
        let id = MatchId::from("m1");
        store
            .write_points(&[
                Point::player(id.clone(), PlayerSlot::TopLeft, 0.0, 0.0, 0),
                Point::player(id.clone(), PlayerSlot::TopLeft, 3.0, 4.0, 1_000),
                Point::ball(id.clone(), 1.0, 1.0, None, 0),
                Point::ball(id.clone(), 1.0, 1.5, None, 1_000),
            ])
            .await
            .unwrap();

        let aggregator = MotionAggregator::new(store, AnalyticsConfig::default());
        let summary = aggregator.compute(&id).await.unwrap();
        assert_eq!(summary.distances[&TL], 5.0);
        assert_eq!(summary.avg_speeds[&Entity::Ball], 0.5);
    }
}
