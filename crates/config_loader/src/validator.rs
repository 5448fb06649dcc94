//! Configuration validation
//!
//! Rules:
//! - field ranges declared on the config structs (`validator` derives)
//! - ball speed cap <= ball discard threshold
//! - gate window reaches back past the writer lookback
//! - influx backend has url / org / bucket / token
//! - file record store has a path

use contracts::{ContractError, PipelineConfig, RecordsBackend, StoreBackend};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a PipelineConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &PipelineConfig) -> Result<(), ContractError> {
    validate_ranges(config)?;
    validate_speed_thresholds(config)?;
    validate_gate_window(config)?;
    validate_store(config)?;
    validate_records(config)?;
    Ok(())
}

/// Field-level ranges declared with `#[validate(...)]`
fn validate_ranges(config: &PipelineConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_error(&errors, "")
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Walk nested validation errors down to the first failing leaf field
fn first_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_error(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_error(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn validate_speed_thresholds(config: &PipelineConfig) -> Result<(), ContractError> {
    let analytics = &config.analytics;
    if analytics.ball_speed_cap > analytics.ball_speed_discard {
        return Err(ContractError::config_validation(
            "analytics.ball_speed_cap / analytics.ball_speed_discard",
            format!(
                "ball_speed_cap ({}) must be <= ball_speed_discard ({})",
                analytics.ball_speed_cap, analytics.ball_speed_discard
            ),
        ));
    }
    Ok(())
}

/// Points are stamped `lookback` in the past; a shorter gate window would
/// never see them.
fn validate_gate_window(config: &PipelineConfig) -> Result<(), ContractError> {
    if config.gate.window_secs <= config.writer.lookback_secs {
        return Err(ContractError::config_validation(
            "gate.window_secs",
            format!(
                "window_secs ({}) must be > writer.lookback_secs ({})",
                config.gate.window_secs, config.writer.lookback_secs
            ),
        ));
    }
    Ok(())
}

fn validate_store(config: &PipelineConfig) -> Result<(), ContractError> {
    let store = &config.store;
    if store.backend != StoreBackend::Influx {
        return Ok(());
    }

    let required = [
        ("store.url", &store.url),
        ("store.org", &store.org),
        ("store.bucket", &store.bucket),
        ("store.token", &store.token),
    ];
    for (field, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            return Err(ContractError::config_validation(
                field,
                "required when store.backend = \"influx\"",
            ));
        }
    }
    Ok(())
}

fn validate_records(config: &PipelineConfig) -> Result<(), ContractError> {
    if config.records.backend == RecordsBackend::File && config.records.path.is_none() {
        return Err(ContractError::config_validation(
            "records.path",
            "required when records.backend = \"file\"",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn influx_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.store.backend = StoreBackend::Influx;
        config.store.url = Some("http://localhost:8086".into());
        config.store.org = Some("org".into());
        config.store.bucket = Some("bucket".into());
        config.store.token = Some("token".into());
        config
    }

    #[test]
    fn test_default_config_valid() {
        assert!(validate(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_influx_config_valid() {
        assert!(validate(&influx_config()).is_ok());
    }

    #[test]
    fn test_range_error_names_nested_field() {
        let mut config = PipelineConfig::default();
        config.analytics.court.cell_size = 0.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("analytics.court.cell_size"), "got: {err}");
    }

    #[test]
    fn test_cap_above_discard() {
        let mut config = PipelineConfig::default();
        config.analytics.ball_speed_cap = 50.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("ball_speed_discard"), "got: {err}");
    }

    #[test]
    fn test_gate_window_shorter_than_lookback() {
        let mut config = PipelineConfig::default();
        config.gate.window_secs = 1800;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("gate.window_secs"), "got: {err}");
    }

    #[test]
    fn test_influx_missing_bucket() {
        let mut config = influx_config();
        config.store.bucket = Some("  ".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("store.bucket"), "got: {err}");
    }

    #[test]
    fn test_file_records_need_path() {
        let mut config = PipelineConfig::default();
        config.records.backend = RecordsBackend::File;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("records.path"), "got: {err}");
    }
}
