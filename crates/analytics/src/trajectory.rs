//! Store rows to per-entity trajectories

use std::collections::BTreeMap;

use contracts::{Entity, EntityKind, EntityTrajectory, MatchId, SampleRow, TimeSeriesQuery};
use tracing::debug;

use crate::error::Result;

/// Group rows by entity; each trajectory is sorted and de-duplicated
pub fn group_trajectories(rows: Vec<SampleRow>) -> BTreeMap<Entity, EntityTrajectory> {
    let mut grouped: BTreeMap<Entity, Vec<_>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.entity).or_default().push(row.sample);
    }
    grouped
        .into_iter()
        .map(|(entity, samples)| (entity, EntityTrajectory::new(entity, samples)))
        .collect()
}

/// Query and group all samples of one entity kind
pub async fn load_trajectories<Q: TimeSeriesQuery>(
    store: &Q,
    match_id: &MatchId,
    kind: EntityKind,
) -> Result<BTreeMap<Entity, EntityTrajectory>> {
    let rows = store.samples(match_id, kind).await?;
    let row_count = rows.len();
    let trajectories = group_trajectories(rows);
    debug!(
        match_id = %match_id,
        kind = %kind,
        rows = row_count,
        entities = trajectories.len(),
        "trajectories loaded"
    );
    Ok(trajectories)
}
