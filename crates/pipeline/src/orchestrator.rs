//! AnalyticsOrchestrator - coordinates one match from run to record.
//!
//! Sequence per match: `analyzing` -> purge -> write -> gate ->
//! motion / peak speed / heatmap (concurrently) -> store analysis.
//! The purge runs when configured and whenever the match left `pending`
//! before, so an earlier run's points can neither satisfy the gate nor
//! reach the aggregates. Any error moves the record to `failed` and is
//! returned to the caller.

use std::sync::Arc;

use analytics::{HeatmapBuilder, MotionAggregator, PeakSpeedEstimator};
use contracts::{
    AnalysisResult, MatchId, MatchRecordStore, MatchStatus, PipelineConfig, TimeSeriesStore,
    TrackingRun,
};
use ingestion::{IngestionError, TimeSeriesWriter, WriteVisibilityGate};
use observability::{record_analysis, record_match_finished, record_stage, Stage};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::stats::PipelineStats;

/// Result of a successful orchestration
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// The analysis now attached to the match record
    pub analysis: AnalysisResult,
    pub stats: PipelineStats,
}

/// Drives matches through write, visibility wait, aggregation and persist
///
/// Holds no per-match state, so one instance serves any number of
/// concurrent matches over the shared store handles.
pub struct AnalyticsOrchestrator<S, R> {
    store: Arc<S>,
    records: Arc<R>,
    config: PipelineConfig,
    writer: TimeSeriesWriter<S>,
    gate: WriteVisibilityGate<S>,
    motion: MotionAggregator<S>,
    peak: PeakSpeedEstimator<S>,
    heatmap: HeatmapBuilder<S>,
}

impl<S, R> AnalyticsOrchestrator<S, R>
where
    S: TimeSeriesStore,
    R: MatchRecordStore + Sync,
{
    pub fn new(store: Arc<S>, records: Arc<R>, config: PipelineConfig) -> Self {
        Self {
            writer: TimeSeriesWriter::new(store.clone(), config.writer.clone()),
            gate: WriteVisibilityGate::new(store.clone(), config.gate.clone()),
            motion: MotionAggregator::new(store.clone(), config.analytics.clone()),
            peak: PeakSpeedEstimator::new(store.clone(), config.analytics.clone()),
            heatmap: HeatmapBuilder::new(store.clone(), config.analytics.court.clone()),
            store,
            records,
            config,
        }
    }

    /// Pin the writer's synthetic clock instead of deriving it from now
    pub fn with_base_time(mut self, base_time_ms: i64) -> Self {
        self.writer = self.writer.with_base_time(base_time_ms);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn records(&self) -> &Arc<R> {
        &self.records
    }

    /// Write `run` for `match_id`, derive its analytics and store them.
    ///
    /// # Errors
    /// - `NothingWritten` when the writer reports 0 field units
    /// - `VisibilityTimeout` when the store never shows the writes
    /// - `DataMissing` when the match has no ball samples
    /// - record store errors
    #[instrument(
        name = "finalize_match",
        skip(self, run),
        fields(match_id = %match_id, frames = run.len())
    )]
    pub async fn finalize_match(
        &self,
        match_id: &MatchId,
        run: &TrackingRun,
    ) -> Result<MatchOutcome> {
        let started = Instant::now();
        let mut stats = PipelineStats::new(match_id.clone());
        stats.frames = run.len();

        let result = self.write_and_analyze(match_id, run, &mut stats).await;
        self.settle(match_id, result, stats, started).await
    }

    /// Analyze points that were already written, given the writer's count.
    #[instrument(name = "finalize_written", skip(self), fields(match_id = %match_id))]
    pub async fn finalize_written(
        &self,
        match_id: &MatchId,
        units_written: u64,
    ) -> Result<MatchOutcome> {
        let started = Instant::now();
        let mut stats = PipelineStats::new(match_id.clone());
        stats.units_written = units_written;

        let result = self.analyze_written(match_id, units_written, &mut stats).await;
        self.settle(match_id, result, stats, started).await
    }

    async fn write_and_analyze(
        &self,
        match_id: &MatchId,
        run: &TrackingRun,
        stats: &mut PipelineStats,
    ) -> Result<AnalysisResult> {
        let previous = self.begin(match_id).await?;

        if self.config.writer.purge_before_write || previous != MatchStatus::Pending {
            debug!(previous = %previous, "purging earlier points");
            let started = Instant::now();
            self.store.delete_match(match_id).await?;
            finish_stage(stats, Stage::Purge, started);
        }

        let started = Instant::now();
        let base = self.writer.base_time_ms(run);
        let written = self.writer.write_at(match_id, run, base).await;
        finish_stage(stats, Stage::Write, started);
        stats.units_written = written;

        self.analyze(match_id, written, Some(base), stats).await
    }

    async fn analyze_written(
        &self,
        match_id: &MatchId,
        units_written: u64,
        stats: &mut PipelineStats,
    ) -> Result<AnalysisResult> {
        self.begin(match_id).await?;
        self.analyze(match_id, units_written, None, stats).await
    }

    /// Move the match to `analyzing`, returning the status it had before
    async fn begin(&self, match_id: &MatchId) -> Result<MatchStatus> {
        let previous = self.records.register(match_id).await?.status;
        self.records
            .set_status(match_id, MatchStatus::Analyzing)
            .await?;
        info!(previous = %previous, "match analyzing");
        Ok(previous)
    }

    async fn analyze(
        &self,
        match_id: &MatchId,
        units_written: u64,
        earliest_ms: Option<i64>,
        stats: &mut PipelineStats,
    ) -> Result<AnalysisResult> {
        if units_written == 0 {
            return Err(IngestionError::NothingWritten {
                match_id: match_id.to_string(),
            }
            .into());
        }

        let started = Instant::now();
        let outcome = self
            .gate
            .await_visible_from(match_id, units_written, earliest_ms)
            .await?;
        finish_stage(stats, Stage::Gate, started);
        stats.gate_attempts = outcome.attempts;

        let started = Instant::now();
        let (motion, max_speeds, heatmap) = tokio::try_join!(
            self.motion.compute(match_id),
            self.peak.compute(match_id),
            self.heatmap.build(match_id),
        )?;
        finish_stage(stats, Stage::Aggregate, started);

        let analysis = AnalysisResult {
            distances: motion.distances,
            avg_speeds: motion.avg_speeds,
            max_speeds,
            heatmap,
        };

        let started = Instant::now();
        self.records.store_analysis(match_id, &analysis).await?;
        finish_stage(stats, Stage::Persist, started);

        Ok(analysis)
    }

    async fn settle(
        &self,
        match_id: &MatchId,
        result: Result<AnalysisResult>,
        mut stats: PipelineStats,
        started: Instant,
    ) -> Result<MatchOutcome> {
        stats.duration = started.elapsed();
        match result {
            Ok(analysis) => {
                record_match_finished(true);
                record_analysis(&analysis);
                stats.log();
                Ok(MatchOutcome { analysis, stats })
            }
            Err(e) => {
                record_match_finished(false);
                error!(error = %e, "match analysis failed");
                if let Err(mark_err) = self.records.mark_failed(match_id, &e.to_string()).await {
                    warn!(error = %mark_err, "could not mark match failed");
                }
                Err(e)
            }
        }
    }
}

fn finish_stage(stats: &mut PipelineStats, stage: Stage, started: Instant) {
    let elapsed = started.elapsed();
    record_stage(stage, elapsed);
    debug!(stage = %stage, elapsed_ms = elapsed.as_millis() as u64, "stage finished");
    stats.stages.push((stage, elapsed));
}
