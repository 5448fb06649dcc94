//! `purge` command implementation.

use anyhow::{Context, Result};
use contracts::{MatchId, StoreBackend, TimeSeriesWrite};
use tracing::{info, warn};
use tsdb::Store;

use super::load_config;
use crate::cli::PurgeArgs;
use crate::error::CliError;

/// Execute the `purge` command
pub async fn run_purge(args: &PurgeArgs) -> Result<()> {
    if !args.yes {
        return Err(CliError::confirmation_required(format!(
            "purge match '{}'",
            args.match_id
        ))
        .into());
    }

    let config = load_config(&args.config)?;
    if config.store.backend == StoreBackend::Memory {
        return Err(CliError::ProcessLocalStore {
            command: "purge".into(),
        }
        .into());
    }

    let store = Store::from_config(&config.store).context("Failed to create time-series store")?;

    let match_id = MatchId::from(args.match_id.as_str());
    warn!(match_id = %match_id, store = ?store.backend(), "Deleting all points of match");
    store
        .delete_match(&match_id)
        .await
        .with_context(|| format!("Failed to purge match '{match_id}'"))?;

    info!(match_id = %match_id, "Match points deleted");
    println!("✓ Purged match {match_id}");
    Ok(())
}
