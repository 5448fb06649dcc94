//! PipelineConfig - Config Loader output
//!
//! Describes the stores, the writer, the visibility gate and the analytics
//! thresholds. Every section has defaults, so an empty file is a valid
//! in-memory configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::MEASUREMENT;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Time-series store
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// TimeSeriesWriter settings
    #[serde(default)]
    #[validate(nested)]
    pub writer: WriterConfig,

    /// WriteVisibilityGate policy
    #[serde(default)]
    #[validate(nested)]
    pub gate: GateConfig,

    /// Aggregation thresholds
    #[serde(default)]
    #[validate(nested)]
    pub analytics: AnalyticsConfig,

    /// Match record store
    #[serde(default)]
    pub records: RecordsConfig,
}

/// Time-series store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-process store (tests, dry runs)
    #[default]
    Memory,
    /// InfluxDB v2 HTTP API
    Influx,
}

/// Time-series store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// InfluxDB base URL, e.g. `http://localhost:8086`
    pub url: Option<String>,

    /// InfluxDB API token
    pub token: Option<String>,

    /// InfluxDB organisation
    pub org: Option<String>,

    /// InfluxDB bucket
    pub bucket: Option<String>,

    /// Measurement name for tracking points
    #[validate(length(min = 1))]
    pub measurement: String,

    /// HTTP request timeout (seconds)
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// Memory backend only: delay before a write becomes visible to queries
    pub visibility_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            token: None,
            org: None,
            bucket: None,
            measurement: MEASUREMENT.to_string(),
            request_timeout_secs: 30,
            visibility_delay_ms: 0,
        }
    }
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn visibility_delay(&self) -> Duration {
        Duration::from_millis(self.visibility_delay_ms)
    }
}

/// TimeSeriesWriter configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WriterConfig {
    /// Synthetic clock starts this far before ingestion time (seconds)
    pub lookback_secs: u64,

    /// Points per store write call
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// Delete existing points of the match before writing
    pub purge_before_write: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            lookback_secs: 3600,
            batch_size: 5000,
            purge_before_write: false,
        }
    }
}

impl WriterConfig {
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }
}

/// WriteVisibilityGate policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GateConfig {
    /// Count queries before giving up
    #[validate(range(min = 1))]
    pub max_retries: u32,

    /// Sleep between count queries (ms)
    pub retry_delay_ms: u64,

    /// How far back the count query looks (seconds)
    #[validate(range(min = 1))]
    pub window_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_retries: 100,
            retry_delay_ms: 500,
            window_secs: 2 * 3600,
        }
    }
}

impl GateConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Aggregation thresholds
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Instantaneous player speed ceiling (units/s)
    #[validate(range(exclusive_min = 0.0))]
    pub player_speed_cap: f64,

    /// Instantaneous ball speed ceiling (units/s)
    #[validate(range(exclusive_min = 0.0))]
    pub ball_speed_cap: f64,

    /// Ball samples faster than this are sensor faults and dropped (units/s)
    #[validate(range(exclusive_min = 0.0))]
    pub ball_speed_discard: f64,

    /// Ball steps longer than this are excluded from distance (units)
    #[validate(range(exclusive_min = 0.0))]
    pub ball_step_max: f64,

    /// Speed smoothing window (ms)
    #[validate(range(min = 1))]
    pub window_ms: i64,

    /// Court geometry for the heatmap
    #[validate(nested)]
    pub court: CourtConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            player_speed_cap: 9.0,
            ball_speed_cap: 35.0,
            ball_speed_discard: 40.0,
            ball_step_max: 1.0,
            window_ms: 1000,
            court: CourtConfig::default(),
        }
    }
}

/// Court geometry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CourtConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub width: f64,

    #[validate(range(exclusive_min = 0.0))]
    pub height: f64,

    #[validate(range(exclusive_min = 0.0))]
    pub cell_size: f64,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 20.0,
            cell_size: 0.25,
        }
    }
}

impl CourtConfig {
    /// y coordinate of the net line
    pub fn net_y(&self) -> f64 {
        self.height / 2.0
    }
}

/// Match record store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordsBackend {
    #[default]
    Memory,
    /// One JSON document per match under `path`
    File,
}

/// Match record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub backend: RecordsBackend,
    pub path: Option<PathBuf>,
}
