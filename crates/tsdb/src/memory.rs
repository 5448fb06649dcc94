//! In-process time-series store
//!
//! Behaves like an eventually consistent TSDB: accepted points become
//! visible to queries only after `visibility_delay`, and queries stop at
//! the current wall-clock time the way a Flux `range()` does. Points sharing
//! (match, entity, timestamp) overwrite each other. Failures can be
//! injected for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use contracts::{
    ContractError, Entity, EntityKind, MatchId, Point, SampleRow, TimeSeriesQuery,
    TimeSeriesWrite,
};
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::error::TsdbError;

/// Memory store configuration
#[derive(Debug, Default, Clone)]
pub struct MemoryStoreConfig {
    /// Delay between write acceptance and query visibility
    pub visibility_delay: Duration,
    /// Reject every write
    pub fail_writes: bool,
    /// Fail this many queries before answering normally
    pub fail_queries: u32,
}

type SeriesKey = (MatchId, Entity, i64);

struct StoredPoint {
    point: Point,
    visible_at: Instant,
}

#[derive(Default)]
struct MemoryState {
    points: HashMap<SeriesKey, StoredPoint>,
    failed_queries: u32,
    write_calls: u64,
}

/// In-process store
pub struct MemoryStore {
    config: MemoryStoreConfig,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create a store where writes are visible immediately
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create a store with delay and failure injection
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Points stored for a match, visible or not
    pub fn point_count(&self, match_id: &MatchId) -> usize {
        self.lock()
            .points
            .keys()
            .filter(|(id, _, _)| id == match_id)
            .count()
    }

    /// Stored points of a match, sorted by time then entity
    pub fn points(&self, match_id: &MatchId) -> Vec<Point> {
        let mut points: Vec<Point> = self
            .lock()
            .points
            .values()
            .filter(|stored| &stored.point.match_id == match_id)
            .map(|stored| stored.point.clone())
            .collect();
        points.sort_by_key(|p| (p.timestamp_ms, p.entity));
        points
    }

    /// Number of `write_points` calls accepted so far
    pub fn write_calls(&self) -> u64 {
        self.lock().write_calls
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Points already flushed and not stamped after now
    fn queryable(state: &MemoryState) -> impl Iterator<Item = &StoredPoint> {
        let flushed = Instant::now();
        let stop_ms = Utc::now().timestamp_millis();
        state
            .points
            .values()
            .filter(move |s| s.visible_at <= flushed && s.point.timestamp_ms <= stop_ms)
    }

    fn check_query_failure(&self, match_id: &MatchId) -> Result<(), ContractError> {
        let mut state = self.lock();
        if state.failed_queries < self.config.fail_queries {
            state.failed_queries += 1;
            return Err(TsdbError::Injected("query rejected".into()).into_query_error(match_id));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesWrite for MemoryStore {
    #[instrument(name = "memory_store_write", skip(self, points), fields(points = points.len()))]
    async fn write_points(&self, points: &[Point]) -> Result<(), ContractError> {
        if self.config.fail_writes {
            let match_id = points.first().map(|p| p.match_id.clone()).unwrap_or_default();
            return Err(TsdbError::Injected("write rejected".into()).into_write_error(&match_id));
        }

        let visible_at = Instant::now() + self.config.visibility_delay;
        let mut state = self.lock();
        state.write_calls += 1;
        for point in points {
            let key = (point.match_id.clone(), point.entity, point.timestamp_ms);
            state.points.insert(
                key,
                StoredPoint {
                    point: point.clone(),
                    visible_at,
                },
            );
        }
        debug!(stored = state.points.len(), "points accepted");
        Ok(())
    }

    #[instrument(name = "memory_store_delete", skip(self), fields(match_id = %match_id))]
    async fn delete_match(&self, match_id: &MatchId) -> Result<(), ContractError> {
        let mut state = self.lock();
        let before = state.points.len();
        state.points.retain(|(id, _, _), _| id != match_id);
        debug!(removed = before - state.points.len(), "match points deleted");
        Ok(())
    }
}

impl TimeSeriesQuery for MemoryStore {
    #[instrument(name = "memory_store_count", skip(self), fields(match_id = %match_id))]
    async fn count_fields(&self, match_id: &MatchId, since_ms: i64) -> Result<u64, ContractError> {
        self.check_query_failure(match_id)?;
        let state = self.lock();
        Ok(Self::queryable(&state)
            .filter(|s| &s.point.match_id == match_id && s.point.timestamp_ms >= since_ms)
            .map(|s| s.point.field_count())
            .sum())
    }

    #[instrument(
        name = "memory_store_samples",
        skip(self),
        fields(match_id = %match_id, kind = %kind)
    )]
    async fn samples(
        &self,
        match_id: &MatchId,
        kind: EntityKind,
    ) -> Result<Vec<SampleRow>, ContractError> {
        self.check_query_failure(match_id)?;
        let state = self.lock();
        Ok(Self::queryable(&state)
            .filter(|s| &s.point.match_id == match_id && s.point.kind() == kind)
            .map(|s| SampleRow {
                entity: s.point.entity,
                sample: contracts::Sample::new(s.point.timestamp_ms, s.point.x, s.point.y),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PlayerSlot;

    fn points(id: &MatchId) -> Vec<Point> {
        vec![
            Point::player(id.clone(), PlayerSlot::TopLeft, 1.0, 2.0, 1_000),
            Point::player(id.clone(), PlayerSlot::BottomRight, 3.0, 4.0, 1_000),
            Point::ball(id.clone(), 5.0, 6.0, None, 1_000),
        ]
    }

    #[tokio::test]
    async fn test_count_fields() {
        let store = MemoryStore::new();
        let id = MatchId::from("m1");
        store.write_points(&points(&id)).await.unwrap();

        assert_eq!(store.count_fields(&id, 0).await.unwrap(), 7);
        assert_eq!(store.count_fields(&id, 1_001).await.unwrap(), 0);
        assert_eq!(store.count_fields(&MatchId::from("other"), 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_instant_overwrites() {
        let store = MemoryStore::new();
        let id = MatchId::from("m1");
        store.write_points(&points(&id)).await.unwrap();
        store.write_points(&points(&id)).await.unwrap();
        assert_eq!(store.point_count(&id), 3);
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_delay() {
        let store = MemoryStore::with_config(MemoryStoreConfig {
            visibility_delay: Duration::from_millis(800),
            ..Default::default()
        });
        let id = MatchId::from("m1");
        store.write_points(&points(&id)).await.unwrap();

        assert_eq!(store.count_fields(&id, 0).await.unwrap(), 0);
        tokio::time::advance(Duration::from_millis(800)).await;
        assert_eq!(store.count_fields(&id, 0).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_future_points_are_not_queried() {
        let store = MemoryStore::new();
        let id = MatchId::from("m1");
        let later = Utc::now().timestamp_millis() + 600_000;
        store
            .write_points(&[Point::ball(id.clone(), 1.0, 1.0, None, later)])
            .await
            .unwrap();

        assert_eq!(store.point_count(&id), 1);
        assert_eq!(store.count_fields(&id, 0).await.unwrap(), 0);
        assert!(store.samples(&id, EntityKind::Ball).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_samples_by_kind() {
        let store = MemoryStore::new();
        let id = MatchId::from("m1");
        store.write_points(&points(&id)).await.unwrap();

        let players = store.samples(&id, EntityKind::Player).await.unwrap();
        let ball = store.samples(&id, EntityKind::Ball).await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(ball.len(), 1);
        assert_eq!(ball[0].sample.x, 5.0);
    }

    #[tokio::test]
    async fn test_delete_match() {
        let store = MemoryStore::new();
        let a = MatchId::from("a");
        let b = MatchId::from("b");
        store.write_points(&points(&a)).await.unwrap();
        store.write_points(&points(&b)).await.unwrap();

        store.delete_match(&a).await.unwrap();
        assert_eq!(store.point_count(&a), 0);
        assert_eq!(store.point_count(&b), 3);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::with_config(MemoryStoreConfig {
            fail_writes: true,
            fail_queries: 1,
            ..Default::default()
        });
        let id = MatchId::from("m1");
        let err = store.write_points(&points(&id)).await.unwrap_err();
        assert!(matches!(err, ContractError::StoreWrite { .. }));

        assert!(store.count_fields(&id, 0).await.is_err());
        assert_eq!(store.count_fields(&id, 0).await.unwrap(), 0);
    }
}
