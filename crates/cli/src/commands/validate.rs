//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{PipelineConfig, RecordsBackend, StoreBackend};
use ingestion::PayloadSummary;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::read_payload;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    payloads: Vec<PayloadReport>,
}

#[derive(Serialize)]
struct ConfigSummary {
    store: String,
    measurement: String,
    records: String,
    lookback_secs: u64,
    batch_size: usize,
    gate_max_retries: u32,
    gate_retry_delay_ms: u64,
    gate_window_secs: u64,
}

#[derive(Serialize)]
struct PayloadReport {
    path: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<PayloadSummary>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Validation failed")
    }
}

fn validate(args: &ValidateArgs) -> ValidationResult {
    let mut result = validate_config(args.config.as_deref());

    for path in &args.payload {
        let report = validate_payload(path);
        if let Some(ref summary) = report.summary {
            result.warnings.extend(payload_warnings(&report.path, summary));
        }
        result.valid &= report.valid;
        result.payloads.push(report);
    }
    result
}

fn validate_config(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string());

    let loaded = match path {
        Some(p) if !p.exists() => Err(format!("File not found: {}", p.display())),
        Some(p) => {
            info!(config = %p.display(), "Validating configuration");
            config_loader::ConfigLoader::load_from_path(p).map_err(|e| e.to_string())
        }
        None => Ok(PipelineConfig::default()),
    };

    match loaded {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: config_warnings(&config),
            summary: Some(ConfigSummary {
                store: format!("{:?}", config.store.backend).to_lowercase(),
                measurement: config.store.measurement.clone(),
                records: format!("{:?}", config.records.backend).to_lowercase(),
                lookback_secs: config.writer.lookback_secs,
                batch_size: config.writer.batch_size,
                gate_max_retries: config.gate.max_retries,
                gate_retry_delay_ms: config.gate.retry_delay_ms,
                gate_window_secs: config.gate.window_secs,
            }),
            payloads: Vec::new(),
        },
        Err(error) => ValidationResult {
            valid: false,
            config_path,
            error: Some(error),
            warnings: Vec::new(),
            summary: None,
            payloads: Vec::new(),
        },
    }
}

fn validate_payload(path: &Path) -> PayloadReport {
    let display = path.display().to_string();
    match read_payload(path) {
        Ok(run) => PayloadReport {
            path: display,
            valid: true,
            error: None,
            summary: Some(PayloadSummary::from_run(&run)),
        },
        Err(e) => PayloadReport {
            path: display,
            valid: false,
            error: Some(e.to_string()),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn config_warnings(config: &PipelineConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.store.backend == StoreBackend::Memory {
        warnings.push("store.backend = memory - points are lost when the process exits".into());
    }
    if config.records.backend == RecordsBackend::Memory {
        warnings.push("records.backend = memory - analyses are lost when the process exits".into());
    }
    if config.writer.lookback_secs >= config.gate.window_secs {
        warnings.push(format!(
            "writer.lookback_secs ({}) >= gate.window_secs ({}) - the gate will never see the writes",
            config.writer.lookback_secs, config.gate.window_secs
        ));
    }

    warnings
}

fn payload_warnings(path: &str, summary: &PayloadSummary) -> Vec<String> {
    let mut warnings = Vec::new();
    if summary.expected_units == 0 {
        warnings.push(format!("{path}: no detected samples - analysis would fail"));
    } else if summary.ball_samples == 0 {
        warnings.push(format!("{path}: no ball samples - match duration is unknown"));
    }
    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);
    } else {
        println!("✗ Validation failed: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }

    if let Some(ref summary) = result.summary {
        println!("\n  Store: {} ({})", summary.store, summary.measurement);
        println!("  Records: {}", summary.records);
        println!(
            "  Writer: lookback {}s, batch {}",
            summary.lookback_secs, summary.batch_size
        );
        println!(
            "  Gate: {} x {}ms over {}s",
            summary.gate_max_retries, summary.gate_retry_delay_ms, summary.gate_window_secs
        );
    }

    for payload in &result.payloads {
        match (&payload.summary, &payload.error) {
            (Some(summary), _) => println!(
                "\n  ✓ {}: {} frames @ {} fps, {} field units",
                payload.path, summary.frames, summary.fps, summary.expected_units
            ),
            (None, Some(error)) => println!("\n  ✗ {}: {}", payload.path, error),
            (None, None) => println!("\n  ✗ {}", payload.path),
        }
    }

    if !result.warnings.is_empty() {
        println!("\n⚠ Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}
