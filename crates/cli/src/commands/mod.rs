//! Command implementations.

mod analyze;
mod purge;
mod show;
mod validate;

pub use analyze::run_analyze;
pub use purge::run_purge;
pub use show::run_show;
pub use validate::run_validate;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{PipelineConfig, RecordsBackend, StoreBackend, TrackingRun};
use std::path::Path;
use tracing::info;

use crate::cli::{ConfigArgs, StoreArg};
use crate::error::CliError;

/// Load the configuration file (or defaults) and apply CLI overrides
pub(crate) fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration file, using defaults");
            PipelineConfig::default()
        }
    };

    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config).context("Configuration invalid after CLI overrides")?;
    Ok(config)
}

fn apply_overrides(config: &mut PipelineConfig, args: &ConfigArgs) {
    if let Some(store) = args.store {
        config.store.backend = match store {
            StoreArg::Memory => StoreBackend::Memory,
            StoreArg::Influx => StoreBackend::Influx,
        };
    }
    if let Some(ref url) = args.influx_url {
        config.store.url = Some(url.clone());
    }
    if let Some(ref token) = args.influx_token {
        config.store.token = Some(token.clone());
    }
    if let Some(ref org) = args.influx_org {
        config.store.org = Some(org.clone());
    }
    if let Some(ref bucket) = args.influx_bucket {
        config.store.bucket = Some(bucket.clone());
    }
    if let Some(ref path) = args.records_path {
        info!(path = %path.display(), "Overriding match record path from CLI");
        config.records.backend = RecordsBackend::File;
        config.records.path = Some(path.clone());
    }
}

/// Read and parse one tracking payload file
pub(crate) fn read_payload(path: &Path) -> Result<TrackingRun> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| CliError::payload(path.display().to_string(), e.to_string()))?;
    ingestion::parse_payload(&body)
        .map_err(|e| CliError::payload(path.display().to_string(), e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_args() -> ConfigArgs {
        ConfigArgs {
            config: None,
            store: None,
            influx_url: None,
            influx_token: None,
            influx_org: None,
            influx_bucket: None,
            records_path: None,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(&config_args()).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.records.backend, RecordsBackend::Memory);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let mut args = config_args();
        args.config = Some("/nonexistent/statpadel.toml".into());
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_influx_overrides_are_validated() {
        let mut args = config_args();
        args.store = Some(StoreArg::Influx);
        assert!(load_config(&args).is_err());

        args.influx_url = Some("http://localhost:8086".into());
        args.influx_token = Some("token".into());
        args.influx_org = Some("club".into());
        args.influx_bucket = Some("tracking".into());
        let config = load_config(&args).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Influx);
        assert_eq!(config.store.bucket.as_deref(), Some("tracking"));
    }

    #[test]
    fn test_records_path_selects_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = config_args();
        args.records_path = Some(dir.path().to_path_buf());
        let config = load_config(&args).unwrap();
        assert_eq!(config.records.backend, RecordsBackend::File);
    }

    #[test]
    fn test_read_payload() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"fps": 25, "frames": [{{"players": {{}}, "ball": {{"x": 1, "y": 1}}}}]}}"#
        )
        .unwrap();
        let run = read_payload(file.path()).unwrap();
        assert_eq!(run.len(), 1);

        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "{{not json").unwrap();
        assert!(read_payload(bad.path()).is_err());
    }
}
