//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// statpadel - Match analytics derivation pipeline
#[derive(Parser, Debug)]
#[command(
    name = "statpadel",
    author,
    version,
    about = "Padel match analytics pipeline",
    long_about = "Writes tracked player and ball positions to a time-series store, waits \n\
                  until they are queryable, and derives distances, speeds and occupancy \n\
                  heatmaps for each match."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        env = "STATPADEL_VERBOSE"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STATPADEL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write tracking payloads and derive their match analytics
    Analyze(AnalyzeArgs),

    /// Validate configuration and payload files without writing
    Validate(ValidateArgs),

    /// Display a stored match record
    Show(ShowArgs),

    /// Delete every stored point of a match
    Purge(PurgeArgs),
}

/// Configuration source and overrides shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "STATPADEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the time-series store backend
    #[arg(long, value_enum, env = "STATPADEL_STORE")]
    pub store: Option<StoreArg>,

    /// Override the InfluxDB URL
    #[arg(long, env = "INFLUX_URL")]
    pub influx_url: Option<String>,

    /// Override the InfluxDB API token
    #[arg(long, env = "INFLUX_TOKEN", hide_env_values = true)]
    pub influx_token: Option<String>,

    /// Override the InfluxDB organisation
    #[arg(long, env = "INFLUX_ORG")]
    pub influx_org: Option<String>,

    /// Override the InfluxDB bucket
    #[arg(long, env = "INFLUX_BUCKET")]
    pub influx_bucket: Option<String>,

    /// Keep match records as JSON files in this directory
    #[arg(long, env = "STATPADEL_RECORDS_PATH")]
    pub records_path: Option<PathBuf>,
}

/// Arguments for the `analyze` command
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Tracking payload files (JSON), one match each
    #[arg(required_unless_present = "written")]
    pub payloads: Vec<PathBuf>,

    /// Match id (single payload only); defaults to the payload file stem
    #[arg(short, long)]
    pub match_id: Option<String>,

    /// Skip writing: analyze points already written, given the writer's count
    #[arg(long, requires = "match_id", conflicts_with = "payloads")]
    pub written: Option<u64>,

    /// Delete the match's existing points before writing
    #[arg(long, env = "STATPADEL_PURGE")]
    pub purge: bool,

    /// Parse payloads and report what would be written, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Print each analysis as JSON instead of statistics
    #[arg(long)]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STATPADEL_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, env = "STATPADEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tracking payload files to check
    #[arg(short, long)]
    pub payload: Vec<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Match id
    pub match_id: String,

    /// Output the whole record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `purge` command
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Match id
    pub match_id: String,

    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

/// Time-series store backend
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StoreArg {
    Memory,
    Influx,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
