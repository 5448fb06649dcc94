//! WriteVisibilityGate - bounded wait for write visibility
//!
//! Polls the store's field count for a match over a recent time range
//! until it reaches what the writer reported. Aggregation queries must not
//! run before this returns.

use std::sync::Arc;

use chrono::Utc;
use contracts::{GateConfig, MatchId, TimeSeriesQuery};
use metrics::{counter, histogram};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};

/// Result of a successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    /// Count queries issued, including the successful one
    pub attempts: u32,
    /// Count returned by the successful query
    pub observed: u64,
}

/// Polls until written points are observable
pub struct WriteVisibilityGate<Q> {
    store: Arc<Q>,
    config: GateConfig,
}

impl<Q: TimeSeriesQuery> WriteVisibilityGate<Q> {
    pub fn new(store: Arc<Q>, config: GateConfig) -> Self {
        Self { store, config }
    }

    /// Wait until at least `expected` field units of `match_id` are visible.
    ///
    /// A failed count query is logged and counts as an attempt.
    ///
    /// # Errors
    /// - `NothingWritten` when `expected` is 0
    /// - `VisibilityTimeout` after `max_retries` attempts
    pub async fn await_visible(&self, match_id: &MatchId, expected: u64) -> Result<GateOutcome> {
        self.await_visible_from(match_id, expected, None).await
    }

    /// Like [`await_visible`](Self::await_visible), with the count range
    /// widened back to `earliest_ms` when the window starts after it.
    #[instrument(
        name = "gate_await_visible",
        skip(self),
        fields(match_id = %match_id, expected, max_retries = self.config.max_retries)
    )]
    pub async fn await_visible_from(
        &self,
        match_id: &MatchId,
        expected: u64,
        earliest_ms: Option<i64>,
    ) -> Result<GateOutcome> {
        if expected == 0 {
            return Err(IngestionError::NothingWritten {
                match_id: match_id.to_string(),
            });
        }

        let started = Instant::now();
        let window_ms = i64::try_from(self.config.window().as_millis()).unwrap_or(i64::MAX);
        let mut observed = 0;

        for attempt in 1..=self.config.max_retries {
            counter!("statpadel_gate_attempts_total").increment(1);
            let window_start = Utc::now().timestamp_millis().saturating_sub(window_ms);
            let since_ms = earliest_ms.map_or(window_start, |e| e.min(window_start));

            match self.store.count_fields(match_id, since_ms).await {
                Ok(count) => {
                    observed = count;
                    if count >= expected {
                        let waited = started.elapsed();
                        histogram!("statpadel_gate_wait_ms")
                            .record(waited.as_secs_f64() * 1000.0);
                        info!(
                            attempt,
                            observed = count,
                            waited_ms = waited.as_millis() as u64,
                            "writes visible"
                        );
                        return Ok(GateOutcome {
                            attempts: attempt,
                            observed: count,
                        });
                    }
                    debug!(attempt, observed = count, "writes not yet visible");
                }
                Err(e) => warn!(attempt, error = %e, "count query failed"),
            }

            if attempt < self.config.max_retries {
                sleep(self.config.retry_delay()).await;
            }
        }

        counter!("statpadel_gate_timeouts_total").increment(1);
        Err(IngestionError::VisibilityTimeout {
            match_id: match_id.to_string(),
            observed,
            expected,
            attempts: self.config.max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Point, PlayerSlot, TimeSeriesWrite};
    use std::time::Duration;
    use tsdb::{MemoryStore, MemoryStoreConfig};

    fn recent_points(id: &MatchId) -> Vec<Point> {
        let ts = Utc::now().timestamp_millis() - 60_000;
        vec![
            Point::player(id.clone(), PlayerSlot::TopLeft, 1.0, 1.0, ts),
            Point::ball(id.clone(), 2.0, 2.0, None, ts),
        ]
    }

    fn gate(store: Arc<MemoryStore>, max_retries: u32) -> WriteVisibilityGate<MemoryStore> {
        WriteVisibilityGate::new(
            store,
            GateConfig {
                max_retries,
                ..Default::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_on_first_attempt() {
        let store = Arc::new(MemoryStore::new());
        let id = MatchId::from("m1");
        store.write_points(&recent_points(&id)).await.unwrap();

        let outcome = gate(store, 100).await_visible(&id, 5).await.unwrap();
        assert_eq!(outcome, GateOutcome { attempts: 1, observed: 5 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_delayed_visibility() {
        let store = Arc::new(MemoryStore::with_config(MemoryStoreConfig {
            visibility_delay: Duration::from_millis(1_200),
            ..Default::default()
        }));
        let id = MatchId::from("m1");
        store.write_points(&recent_points(&id)).await.unwrap();

        // attempts at 0, 500, 1000, 1500 ms
        let outcome = gate(store, 100).await_visible(&id, 5).await.unwrap();
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_max_retries() {
        let store = Arc::new(MemoryStore::new());
        let id = MatchId::from("m1");
        store.write_points(&recent_points(&id)).await.unwrap();

        let err = gate(store, 3).await_visible(&id, 6).await.unwrap_err();
        match err {
            IngestionError::VisibilityTimeout {
                observed,
                expected,
                attempts,
                ..
            } => {
                assert_eq!((observed, expected, attempts), (5, 6, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_count_as_attempts() {
        let store = Arc::new(MemoryStore::with_config(MemoryStoreConfig {
            fail_queries: 2,
            ..Default::default()
        }));
        let id = MatchId::from("m1");
        store.write_points(&recent_points(&id)).await.unwrap();

        let outcome = gate(store, 10).await_visible(&id, 5).await.unwrap();
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_zero_expectation_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let err = gate(store, 10)
            .await_visible(&MatchId::from("m1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::NothingWritten { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_points_outside_window_are_not_counted() {
        let store = Arc::new(MemoryStore::new());
        let id = MatchId::from("m1");
        let old = Utc::now().timestamp_millis() - 3 * 3600 * 1000;
        store
            .write_points(&[Point::player(id.clone(), PlayerSlot::TopLeft, 1.0, 1.0, old)])
            .await
            .unwrap();

        assert!(gate(store, 2).await_visible(&id, 2).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earliest_timestamp_widens_window() {
        let store = Arc::new(MemoryStore::new());
        let id = MatchId::from("m1");
        let old = Utc::now().timestamp_millis() - 3 * 3600 * 1000;
        store
            .write_points(&[Point::player(id.clone(), PlayerSlot::TopLeft, 1.0, 1.0, old)])
            .await
            .unwrap();

        let outcome = gate(store, 2)
            .await_visible_from(&id, 2, Some(old))
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 1);
    }
}
