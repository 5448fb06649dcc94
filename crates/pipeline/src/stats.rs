//! Per-match run statistics.

use std::time::Duration;

use contracts::MatchId;
use observability::{MatchMetricsAggregator, Stage};
use tracing::info;

/// Statistics from one match orchestration
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Match the run belongs to
    pub match_id: MatchId,

    /// Frames in the ingested run (0 when points were written elsewhere)
    pub frames: usize,

    /// Field units the writer reported
    pub units_written: u64,

    /// Count queries the visibility gate issued
    pub gate_attempts: u32,

    /// Stage timings, in execution order
    pub stages: Vec<(Stage, Duration)>,

    /// End-to-end duration
    pub duration: Duration,
}

impl PipelineStats {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            ..Default::default()
        }
    }

    /// Time spent in `stage`, if it ran
    pub fn stage(&self, stage: Stage) -> Option<Duration> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, elapsed)| *elapsed)
    }

    /// Field units written per second of total run time
    pub fn units_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.units_written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fold this run into a multi-match aggregate
    pub fn record_into(&self, aggregator: &mut MatchMetricsAggregator, success: bool) {
        for (stage, elapsed) in &self.stages {
            aggregator.record_stage(*stage, *elapsed);
        }
        aggregator.finish_match(success, self.duration);
    }

    /// Emit the run as one structured log line
    pub fn log(&self) {
        info!(
            match_id = %self.match_id,
            frames = self.frames,
            units_written = self.units_written,
            gate_attempts = self.gate_attempts,
            duration_ms = self.duration.as_millis() as u64,
            "match analyzed"
        );
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Match Analysis Statistics                 ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Match: {}", self.match_id);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames: {}", self.frames);
        println!("   ├─ Field units written: {}", self.units_written);
        println!("   ├─ Units/s: {:.0}", self.units_per_sec());
        println!("   └─ Gate attempts: {}", self.gate_attempts);

        if !self.stages.is_empty() {
            println!("\n⏱️  Stages");
            let last = self.stages.len() - 1;
            for (i, (stage, elapsed)) in self.stages.iter().enumerate() {
                let branch = if i == last { "└─" } else { "├─" };
                println!(
                    "   {} {:<10} {:>10.1} ms",
                    branch,
                    stage.as_str(),
                    elapsed.as_secs_f64() * 1000.0
                );
            }
        }

        println!();
    }
}
