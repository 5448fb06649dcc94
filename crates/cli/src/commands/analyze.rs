//! `analyze` command implementation.

use anyhow::{Context, Result};
use contracts::{AnalysisResult, MatchId, MatchRecordStore, TrackingRun};
use ingestion::PayloadSummary;
use match_store::Records;
use observability::MatchMetricsAggregator;
use pipeline::{AnalyticsOrchestrator, MatchOutcome};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};
use tsdb::Store;

use super::{load_config, read_payload};
use crate::cli::AnalyzeArgs;
use crate::error::CliError;

/// Execute the `analyze` command
pub async fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if args.purge {
        config.writer.purge_before_write = true;
    }

    let jobs = collect_jobs(args)?;
    if args.dry_run {
        info!("Dry run mode - payloads parsed, nothing written");
        return print_dry_run(&jobs, args.json);
    }

    let store = Store::from_config(&config.store).context("Failed to create time-series store")?;
    let records =
        Records::from_config(&config.records).context("Failed to open match record store")?;
    info!(
        store = ?store.backend(),
        records = records.name(),
        matches = jobs.len(),
        "Stores ready"
    );
    let orchestrator = Arc::new(AnalyticsOrchestrator::new(
        Arc::new(store),
        Arc::new(records),
        config,
    ));

    if let Some(units) = args.written {
        let match_id = match_id_arg(args.match_id.as_deref().unwrap_or_default())?;
        let outcome = orchestrator
            .finalize_written(&match_id, units)
            .await
            .with_context(|| format!("Analysis of match '{match_id}' failed"))?;
        return report(&outcome, args.json);
    }

    let total = jobs.len();
    let mut tasks = JoinSet::new();
    for (match_id, run) in jobs {
        let orchestrator = orchestrator.clone();
        tasks.spawn(async move {
            let started = Instant::now();
            let result = orchestrator.finalize_match(&match_id, &run).await;
            (match_id, result, started.elapsed())
        });
    }

    let mut aggregator = MatchMetricsAggregator::new();
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        let (match_id, result, elapsed) = joined.context("Analysis task panicked")?;
        match result {
            Ok(outcome) => {
                outcome.stats.record_into(&mut aggregator, true);
                report(&outcome, args.json)?;
            }
            Err(e) => {
                failed += 1;
                aggregator.finish_match(false, elapsed);
                error!(match_id = %match_id, error = %e, "Match analysis failed");
            }
        }
    }

    if total > 1 && !args.json {
        println!("{}", aggregator.summary());
    }
    if failed > 0 {
        return Err(CliError::BatchFailed { failed, total }.into());
    }

    info!(matches = total, "Analysis finished");
    Ok(())
}

fn collect_jobs(args: &AnalyzeArgs) -> Result<Vec<(MatchId, TrackingRun)>> {
    if args.match_id.is_some() && args.payloads.len() > 1 {
        return Err(CliError::AmbiguousMatchId {
            count: args.payloads.len(),
        }
        .into());
    }

    args.payloads
        .iter()
        .map(|path| {
            let match_id = match &args.match_id {
                Some(id) => match_id_arg(id)?,
                None => match_id_from_path(path)?,
            };
            Ok((match_id, read_payload(path)?))
        })
        .collect()
}

fn match_id_arg(raw: &str) -> Result<MatchId> {
    let match_id = MatchId::from(raw);
    if !match_id.is_valid() {
        anyhow::bail!("Invalid match id '{raw}'");
    }
    Ok(match_id)
}

fn match_id_from_path(path: &Path) -> Result<MatchId> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| CliError::payload(path.display().to_string(), "no usable file name"))?;
    match_id_arg(stem)
}

fn print_dry_run(jobs: &[(MatchId, TrackingRun)], json: bool) -> Result<()> {
    let summaries: BTreeMap<&str, PayloadSummary> = jobs
        .iter()
        .map(|(match_id, run)| (match_id.as_str(), PayloadSummary::from_run(run)))
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&summaries)
            .context("Failed to serialize payload summaries")?;
        println!("{text}");
        return Ok(());
    }

    for (match_id, summary) in summaries {
        println!(
            "{}: {} frames @ {} fps, {} player + {} ball samples, {} field units",
            match_id,
            summary.frames,
            summary.fps,
            summary.player_samples,
            summary.ball_samples,
            summary.expected_units
        );
    }
    Ok(())
}

fn report(outcome: &MatchOutcome, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "matchId": outcome.stats.match_id,
            "analysis": outcome.analysis,
        });
        let text = serde_json::to_string_pretty(&value).context("Failed to serialize analysis")?;
        println!("{text}");
        return Ok(());
    }

    outcome.stats.print_summary();
    print_analysis(&outcome.analysis);
    Ok(())
}

/// Per-entity table followed by heatmap coverage
pub(crate) fn print_analysis(analysis: &AnalysisResult) {
    println!(
        "   {:<14} {:>12} {:>12} {:>12}",
        "entity", "distance", "avg speed", "max speed"
    );
    for (entity, distance) in &analysis.distances {
        let avg = analysis.avg_speeds.get(entity).copied().unwrap_or_default();
        let max = analysis.max_speeds.get(entity).copied().unwrap_or_default();
        println!(
            "   {:<14} {:>12.2} {:>12.2} {:>12.2}",
            entity.as_str(),
            distance,
            avg,
            max
        );
    }

    let heatmap = &analysis.heatmap;
    println!("\n   Heatmap (cell {} units)", heatmap.cell_size);
    for (slot, cells) in &heatmap.heatmap {
        println!(
            "   ├─ {:<12} {} cells, {} visits",
            slot.as_str(),
            cells.len(),
            heatmap.total_visits(*slot)
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
        let mut full = vec!["statpadel", "analyze"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Analyze(args) => args,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_match_id_from_file_stem() {
        let id = match_id_from_path(Path::new("/data/64f1c2.json")).unwrap();
        assert_eq!(id.as_str(), "64f1c2");
    }

    #[test]
    fn test_match_id_rejects_blank() {
        assert!(match_id_arg("  ").is_err());
    }

    #[test]
    fn test_match_id_with_several_payloads() {
        let args = analyze_args(&["a.json", "b.json", "--match-id", "m1"]);
        let err = collect_jobs(&args).unwrap_err();
        assert!(err.to_string().contains("single payload"));
    }

    #[tokio::test]
    async fn test_analyze_payload_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m1.json");
        std::fs::write(
            &path,
            r#"{"fps": 1, "frames": [
                {"players": {"top_left": {"x": 0, "y": 0}}, "ball": {"x": 1, "y": 1}},
                {"players": {"top_left": {"x": 3, "y": 4}}, "ball": {"x": 1.5, "y": 1}}
            ]}"#,
        )
        .unwrap();
        let records = dir.path().join("records");
        let path_arg = path.to_str().unwrap();
        let records_arg = records.to_str().unwrap();

        let args = analyze_args(&[path_arg, "--records-path", records_arg, "--json"]);
        run_analyze(&args).await.unwrap();
        assert!(records.join("m1.json").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m1.json");
        std::fs::write(
            &path,
            r#"{"fps": 25, "frames": [{"players": {}, "ball": {"x": 2, "y": 3}}]}"#,
        )
        .unwrap();
        let records = dir.path().join("records");

        let args = analyze_args(&[
            path.to_str().unwrap(),
            "--records-path",
            records.to_str().unwrap(),
            "--dry-run",
        ]);
        run_analyze(&args).await.unwrap();
        assert!(!records.join("m1.json").exists());
    }
}
