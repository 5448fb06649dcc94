//! `show` command implementation.

use anyhow::{Context, Result};
use contracts::{MatchId, MatchRecord, MatchRecordStore};
use match_store::Records;
use tracing::info;

use super::analyze::print_analysis;
use super::load_config;
use crate::cli::ShowArgs;
use crate::error::CliError;

/// Execute the `show` command
pub async fn run_show(args: &ShowArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let records =
        Records::from_config(&config.records).context("Failed to open match record store")?;
    info!(match_id = %args.match_id, records = records.name(), "Loading match record");

    let match_id = MatchId::from(args.match_id.as_str());
    let record = records
        .load(&match_id)
        .await
        .with_context(|| format!("Failed to load match '{match_id}'"))?
        .ok_or_else(|| CliError::match_not_found(args.match_id.as_str()))?;

    if args.json {
        let text = serde_json::to_string_pretty(&record).context("Failed to serialize record")?;
        println!("{text}");
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &MatchRecord) {
    println!("\n=== Match {} ===\n", record.match_id);
    println!("  Status: {}", record.status);
    println!("  Updated: {}", record.updated_at.to_rfc3339());
    if let Some(ref error) = record.error {
        println!("  Error: {error}");
    }

    match record.analysis {
        Some(ref analysis) => {
            println!();
            print_analysis(analysis);
        }
        None => println!("\n  No analysis stored\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use match_store::FileMatchStore;

    fn show_args(argv: &[&str]) -> ShowArgs {
        let mut full = vec!["statpadel", "show"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Show(args) => args,
            _ => panic!("expected show"),
        }
    }

    #[tokio::test]
    async fn test_show_file_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMatchStore::new(dir.path()).unwrap();
        store.register(&MatchId::from("m1")).await.unwrap();
        let path = dir.path().to_str().unwrap();

        run_show(&show_args(&["m1", "--records-path", path])).await.unwrap();
        run_show(&show_args(&["m1", "--records-path", path, "--json"]))
            .await
            .unwrap();

        let err = run_show(&show_args(&["m2", "--records-path", path]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No record for match 'm2'"));
    }
}
