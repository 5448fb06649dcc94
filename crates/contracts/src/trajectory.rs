//! EntityTrajectory - reconstructed per-entity sample sequences
//!
//! Not persisted. Built from store rows before aggregation.

use serde::{Deserialize, Serialize};

use crate::Entity;

/// Position of one entity at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix epoch milliseconds
    pub timestamp_ms: i64,
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub fn new(timestamp_ms: i64, x: f64, y: f64) -> Self {
        Self { timestamp_ms, x, y }
    }

    /// Euclidean distance to another sample
    pub fn distance_to(&self, other: &Sample) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Row returned by a store sample query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRow {
    pub entity: Entity,
    pub sample: Sample,
}

/// Time-ordered samples of one entity
///
/// Timestamps are strictly increasing. Gaps are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTrajectory {
    entity: Entity,
    samples: Vec<Sample>,
}

impl EntityTrajectory {
    /// Sort samples by time.
    ///
    /// Samples sharing a timestamp collapse to the last one given, the same
    /// way a time-series store overwrites a point written twice.
    pub fn new(entity: Entity, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp_ms);
        let mut deduped: Vec<Sample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match deduped.last_mut() {
                Some(last) if last.timestamp_ms == sample.timestamp_ms => *last = sample,
                _ => deduped.push(sample),
            }
        }
        Self {
            entity,
            samples: deduped,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Milliseconds from first to last sample (0 for fewer than two)
    pub fn span_ms(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        }
    }

    /// Consecutive sample pairs `(previous, current)`
    pub fn steps(&self) -> impl Iterator<Item = (&Sample, &Sample)> + '_ {
        self.samples.windows(2).map(|w| (&w[0], &w[1]))
    }
}
