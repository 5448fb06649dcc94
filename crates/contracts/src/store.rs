//! Time-series store abstraction
//!
//! The write path and the read path are separate traits because they are
//! separate API surfaces on the store; both are shared across concurrent
//! match pipelines through `&self`.

use std::future::Future;

use crate::{ContractError, EntityKind, MatchId, Point, SampleRow};

/// Write side of the time-series store
pub trait TimeSeriesWrite: Send + Sync {
    /// Durably append points
    ///
    /// Returns once the store has accepted the batch. Accepted points may
    /// still not be visible to queries (see the visibility gate).
    fn write_points(
        &self,
        points: &[Point],
    ) -> impl Future<Output = Result<(), ContractError>> + Send;

    /// Remove every point tagged with `match_id`
    fn delete_match(
        &self,
        match_id: &MatchId,
    ) -> impl Future<Output = Result<(), ContractError>> + Send;
}

/// Read side of the time-series store
pub trait TimeSeriesQuery: Send + Sync {
    /// Number of field values tagged with `match_id` whose timestamp is at
    /// or after `since_ms` (epoch ms)
    ///
    /// A player point counts 2 (x, y), a ball point 3 (x, y, bounce).
    fn count_fields(
        &self,
        match_id: &MatchId,
        since_ms: i64,
    ) -> impl Future<Output = Result<u64, ContractError>> + Send;

    /// Every visible position sample of one entity kind for a match,
    /// in no particular order
    fn samples(
        &self,
        match_id: &MatchId,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<SampleRow>, ContractError>> + Send;
}

/// A store offering both paths
pub trait TimeSeriesStore: TimeSeriesWrite + TimeSeriesQuery {}

impl<T: TimeSeriesWrite + TimeSeriesQuery> TimeSeriesStore for T {}
