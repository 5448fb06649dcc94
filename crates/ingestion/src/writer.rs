//! TimeSeriesWriter - TrackingRun to persisted Points
//!
//! Frame `i` is stamped `base + floor(i * 1000 / fps)` ms, where `base` is
//! ingestion time minus the configured lookback, pushed further back for
//! runs longer than the lookback so no frame lands after the write instant.
//! Players count 2 field
//! units (x, y) and the ball 3 (x, y, bounce); the visibility gate waits
//! for the same total.

use std::sync::Arc;

use chrono::Utc;
use contracts::{MatchId, Point, TimeSeriesWrite, TrackingRun, WriterConfig};
use metrics::counter;
use tracing::{debug, info, instrument, warn};

/// Gap kept between the last frame of a long run and the write instant
const SPAN_MARGIN_MS: i64 = 60_000;

/// Writes one tracking run per call
pub struct TimeSeriesWriter<W> {
    store: Arc<W>,
    config: WriterConfig,
    /// Fixed base time (tests); `None` means now minus lookback
    base_time_ms: Option<i64>,
}

impl<W: TimeSeriesWrite> TimeSeriesWriter<W> {
    pub fn new(store: Arc<W>, config: WriterConfig) -> Self {
        Self {
            store,
            config,
            base_time_ms: None,
        }
    }

    /// Pin the synthetic clock start
    pub fn with_base_time(mut self, base_time_ms: i64) -> Self {
        self.base_time_ms = Some(base_time_ms);
        self
    }

    /// Timestamp of frame 0 for writing `run` now
    pub fn base_time_ms(&self, run: &TrackingRun) -> i64 {
        self.base_time_ms.unwrap_or_else(|| {
            let lookback_ms =
                i64::try_from(self.config.lookback().as_millis()).unwrap_or(i64::MAX);
            let offset_ms = lookback_ms.max(run.span_ms().saturating_add(SPAN_MARGIN_MS));
            Utc::now().timestamp_millis().saturating_sub(offset_ms)
        })
    }

    /// Persist a run and return the field units written.
    ///
    /// Store failures are logged and reported as 0: callers must read 0 as
    /// "nothing confirmed written".
    pub async fn write(&self, match_id: &MatchId, run: &TrackingRun) -> u64 {
        self.write_at(match_id, run, self.base_time_ms(run)).await
    }

    /// Persist a run with frame 0 stamped at `base`
    #[instrument(
        name = "writer_write",
        skip(self, run),
        fields(match_id = %match_id, frames = run.len(), fps = run.fps())
    )]
    pub async fn write_at(&self, match_id: &MatchId, run: &TrackingRun, base: i64) -> u64 {
        let points = build_points(match_id, run, base);
        if points.is_empty() {
            warn!("run has no detected samples, nothing written");
            return 0;
        }

        let units: u64 = points.iter().map(Point::field_count).sum();
        for (batch_no, batch) in points.chunks(self.config.batch_size.max(1)).enumerate() {
            if let Err(e) = self.store.write_points(batch).await {
                warn!(error = %e, batch = batch_no, "store write failed, reporting 0 points");
                counter!("statpadel_write_failures_total").increment(1);
                return 0;
            }
            debug!(batch = batch_no, points = batch.len(), "batch written");
        }

        counter!("statpadel_points_written_total").increment(points.len() as u64);
        counter!("statpadel_field_units_written_total").increment(units);
        info!(points = points.len(), units, base_time_ms = base, "run written");
        units
    }
}

/// Points for every detected sample of a run, in frame order
pub fn build_points(match_id: &MatchId, run: &TrackingRun, base_time_ms: i64) -> Vec<Point> {
    let mut points = Vec::with_capacity(run.len() * 5);
    for frame in run.frames() {
        let timestamp_ms = base_time_ms + run.frame_offset_ms(frame.index);
        for (slot, coords) in &frame.players {
            if coords.is_detected() {
                points.push(Point::player(
                    match_id.clone(),
                    *slot,
                    coords.x,
                    coords.y,
                    timestamp_ms,
                ));
            }
        }
        let ball = &frame.ball;
        if ball.position.is_detected() {
            points.push(Point::ball(
                match_id.clone(),
                ball.position.x,
                ball.position.y,
                ball.bounce,
                timestamp_ms,
            ));
        }
    }
    points
}
