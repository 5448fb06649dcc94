//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Payload file unreadable or malformed
    #[error("Invalid payload {path}: {message}")]
    Payload { path: String, message: String },

    /// `--match-id` given together with several payloads
    #[error("--match-id can only be used with a single payload, got {count}")]
    AmbiguousMatchId { count: usize },

    /// No record for the requested match
    #[error("No record for match '{match_id}'")]
    MatchNotFound { match_id: String },

    /// Destructive command run without confirmation
    #[error("Refusing to {action} without --yes")]
    ConfirmationRequired { action: String },

    /// Command needs a store that outlives the process
    #[error("{command} has no effect on the in-process memory store; use --store influx")]
    ProcessLocalStore { command: String },

    /// Some matches of a batch failed
    #[error("{failed} of {total} matches failed")]
    BatchFailed { failed: usize, total: usize },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn payload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Payload {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn match_not_found(match_id: impl Into<String>) -> Self {
        Self::MatchNotFound {
            match_id: match_id.into(),
        }
    }

    pub fn confirmation_required(action: impl Into<String>) -> Self {
        Self::ConfirmationRequired {
            action: action.into(),
        }
    }
}
