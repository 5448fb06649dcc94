//! HeatmapBuilder - per-slot occupancy grid
//!
//! Samples outside the court are dropped, as are samples on the wrong side
//! of the net for the slot (a bottom slot above the net line, a top slot
//! below it). Cells keep first-visit order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use contracts::{
    CourtConfig, CourtHalf, Entity, EntityKind, EntityTrajectory, Heatmap, HeatmapCell, MatchId,
    Sample, TimeSeriesQuery,
};
use tracing::{info, instrument};

use crate::error::Result;
use crate::trajectory::load_trajectories;

fn on_court(sample: &Sample, court: &CourtConfig) -> bool {
    (0.0..court.width).contains(&sample.x) && (0.0..court.height).contains(&sample.y)
}

fn on_own_half(sample: &Sample, half: CourtHalf, court: &CourtConfig) -> bool {
    match half {
        CourtHalf::Bottom => sample.y >= court.net_y(),
        CourtHalf::Top => sample.y <= court.net_y(),
    }
}

/// Bin player samples into cells of `court.cell_size`
pub fn build_heatmap(
    players: &BTreeMap<Entity, EntityTrajectory>,
    court: &CourtConfig,
) -> Heatmap {
    let mut heatmap = BTreeMap::new();

    for (entity, trajectory) in players {
        let Some(slot) = entity.slot() else {
            continue;
        };
        let mut cells: Vec<HeatmapCell> = Vec::new();
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();

        for sample in trajectory.samples() {
            if !on_court(sample, court) || !on_own_half(sample, slot.half(), court) {
                continue;
            }
            let row = (sample.y / court.cell_size).floor() as i64;
            let col = (sample.x / court.cell_size).floor() as i64;
            match index.get(&(row, col)) {
                Some(&i) => cells[i].value += 1,
                None => {
                    index.insert((row, col), cells.len());
                    cells.push(HeatmapCell { row, col, value: 1 });
                }
            }
        }

        if !cells.is_empty() {
            heatmap.insert(slot, cells);
        }
    }

    Heatmap {
        cell_size: court.cell_size,
        heatmap,
    }
}

/// Occupancy heatmap for a match
pub struct HeatmapBuilder<Q> {
    store: Arc<Q>,
    court: CourtConfig,
}

impl<Q: TimeSeriesQuery> HeatmapBuilder<Q> {
    pub fn new(store: Arc<Q>, court: CourtConfig) -> Self {
        Self { store, court }
    }

    #[instrument(name = "heatmap_build", skip(self), fields(match_id = %match_id))]
    pub async fn build(&self, match_id: &MatchId) -> Result<Heatmap> {
        let players = load_trajectories(self.store.as_ref(), match_id, EntityKind::Player).await?;
        let heatmap = build_heatmap(&players, &self.court);
        info!(slots = heatmap.heatmap.len(), "heatmap built");
        Ok(heatmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PlayerSlot, Point, TimeSeriesWrite};
    use tsdb::MemoryStore;

    fn players(slot: PlayerSlot, coords: &[(f64, f64)]) -> BTreeMap<Entity, EntityTrajectory> {
        let entity = Entity::Player(slot);
        let samples = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Sample::new(i as i64 * 40, x, y))
            .collect();
        BTreeMap::from([(entity, EntityTrajectory::new(entity, samples))])
    }

    #[test]
    fn test_cells_and_visit_counts() {
        let map = build_heatmap(
            &players(PlayerSlot::BottomLeft, &[(1.1, 15.1), (1.2, 15.2), (0.0, 10.0)]),
            &CourtConfig::default(),
        );
        assert_eq!(map.cell_size, 0.25);
        assert_eq!(
            map.heatmap[&PlayerSlot::BottomLeft],
            vec![
                HeatmapCell { row: 60, col: 4, value: 2 },
                HeatmapCell { row: 40, col: 0, value: 1 },
            ]
        );
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let map = build_heatmap(
            &players(
                PlayerSlot::TopRight,
                &[(10.0, 5.0), (-0.1, 5.0), (5.0, -0.5), (9.99, 0.0)],
            ),
            &CourtConfig::default(),
        );
        assert_eq!(map.total_visits(PlayerSlot::TopRight), 1);
    }

    #[test]
    fn test_half_crossing_dropped() {
        let court = CourtConfig::default();
        let samples = players(PlayerSlot::BottomRight, &[(5.0, 9.9), (5.0, 10.0)]);
        let bottom = build_heatmap(&samples, &court);
        assert_eq!(bottom.total_visits(PlayerSlot::BottomRight), 1);

        let top = build_heatmap(&players(PlayerSlot::TopLeft, &[(5.0, 10.1), (5.0, 10.0)]), &court);
        assert_eq!(top.total_visits(PlayerSlot::TopLeft), 1);
    }

    #[test]
    fn test_slot_without_valid_samples_omitted() {
        let map = build_heatmap(
            &players(PlayerSlot::TopLeft, &[(5.0, 15.0)]),
            &CourtConfig::default(),
        );
        assert!(map.heatmap.is_empty());
    }

    #[tokio::test]
    async fn test_build_from_store() {
        let store = Arc::new(MemoryStore::new());
        let id = MatchId::from("m1");
        store
            .write_points(&[
                Point::player(id.clone(), PlayerSlot::TopLeft, 2.0, 3.0, 0),
                Point::player(id.clone(), PlayerSlot::TopLeft, 2.1, 3.1, 40),
                Point::ball(id.clone(), 2.0, 3.0, None, 0),
            ])
            .await
            .unwrap();

        let heatmap = HeatmapBuilder::new(store, CourtConfig::default())
            .build(&id)
            .await
            .unwrap();
        assert_eq!(heatmap.heatmap.len(), 1);
        assert_eq!(heatmap.total_visits(PlayerSlot::TopLeft), 2);
    }
}
