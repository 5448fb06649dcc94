//! Pipeline metrics
//!
//! Stage latencies and match outcomes, exported through the `metrics`
//! facade and optionally aggregated in memory for run summaries.

use contracts::AnalysisResult;
use metrics::{counter, gauge, histogram};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Orchestration stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Delete previously written points
    Purge,
    /// Write tracking points
    Write,
    /// Wait for the writes to become visible
    Gate,
    /// Motion, peak speed and heatmap aggregation
    Aggregate,
    /// Store the analysis on the match record
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purge => "purge",
            Self::Write => "write",
            Self::Gate => "gate",
            Self::Aggregate => "aggregate",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record how long one stage took
///
/// # Example
///
/// ```ignore
/// let started = Instant::now();
/// gate.await_visible(&match_id, expected).await?;
/// record_stage(Stage::Gate, started.elapsed());
/// ```
pub fn record_stage(stage: Stage, elapsed: Duration) {
    histogram!("statpadel_stage_duration_ms", "stage" => stage.as_str())
        .record(elapsed.as_secs_f64() * 1000.0);
}

/// Record the end of one match orchestration
pub fn record_match_finished(success: bool) {
    if success {
        counter!("statpadel_matches_analyzed_total").increment(1);
    } else {
        counter!("statpadel_matches_failed_total").increment(1);
    }
}

/// Publish the headline numbers of a finished analysis
pub fn record_analysis(analysis: &AnalysisResult) {
    for (entity, distance) in &analysis.distances {
        histogram!("statpadel_entity_distance", "entity" => entity.as_str()).record(*distance);
    }
    for (entity, speed) in &analysis.max_speeds {
        gauge!("statpadel_last_max_speed", "entity" => entity.as_str()).set(*speed);
    }
    let cells: usize = analysis.heatmap.heatmap.values().map(Vec::len).sum();
    gauge!("statpadel_last_heatmap_cells").set(cells as f64);
}

/// In-memory aggregate over many match orchestrations
#[derive(Debug, Clone, Default)]
pub struct MatchMetricsAggregator {
    /// Matches that reached `analyzed`
    pub analyzed: u64,

    /// Matches that ended `failed`
    pub failed: u64,

    /// End-to-end latency (ms)
    pub total_stats: RunningStats,

    /// Per-stage latency (ms)
    pub stage_stats: BTreeMap<Stage, RunningStats>,
}

impl MatchMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one stage timing
    pub fn record_stage(&mut self, stage: Stage, elapsed: Duration) {
        self.stage_stats
            .entry(stage)
            .or_default()
            .push(elapsed.as_secs_f64() * 1000.0);
    }

    /// Close one match
    pub fn finish_match(&mut self, success: bool, total: Duration) {
        if success {
            self.analyzed += 1;
        } else {
            self.failed += 1;
        }
        self.total_stats.push(total.as_secs_f64() * 1000.0);
    }

    pub fn summary(&self) -> MetricsSummary {
        let matches = self.analyzed + self.failed;
        MetricsSummary {
            matches,
            analyzed: self.analyzed,
            failed: self.failed,
            failure_rate: if matches > 0 {
                self.failed as f64 / matches as f64 * 100.0
            } else {
                0.0
            },
            total_ms: StatsSummary::from(&self.total_stats),
            stages_ms: self
                .stage_stats
                .iter()
                .map(|(stage, stats)| (*stage, StatsSummary::from(stats)))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub matches: u64,
    pub analyzed: u64,
    pub failed: u64,
    pub failure_rate: f64,
    pub total_ms: StatsSummary,
    pub stages_ms: BTreeMap<Stage, StatsSummary>,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pipeline Metrics Summary ===")?;
        writeln!(f, "Matches: {}", self.matches)?;
        writeln!(f, "Analyzed: {}", self.analyzed)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Total (ms): {}", self.total_ms)?;
        for (stage, stats) in &self.stages_ms {
            writeln!(f, "  {:<10} {}", stage.as_str(), stats)?;
        }
        Ok(())
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
