//! Layered error definitions
//!
//! Categorized by source: config / payload / store / records

use thiserror::Error;

use crate::MatchStatus;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Tracking payload is not valid JSON for the expected shape
    #[error("payload parse error: {message}")]
    PayloadParse { message: String },

    /// Tracking payload parsed but is unusable
    #[error("invalid payload at '{field}': {message}")]
    PayloadInvalid { field: String, message: String },

    // ===== Time-Series Store Errors =====
    /// Store connection error
    #[error("store connection error: {message}")]
    StoreConnection { message: String },

    /// Store write error
    #[error("store write error for match '{match_id}': {message}")]
    StoreWrite { match_id: String, message: String },

    /// Store query error
    #[error("store query error for match '{match_id}': {message}")]
    StoreQuery { match_id: String, message: String },

    // ===== Match Record Errors =====
    /// No match record with this id
    #[error("match not found: {match_id}")]
    MatchNotFound { match_id: String },

    /// Status change not allowed by the match state machine
    #[error("match '{match_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        match_id: String,
        from: MatchStatus,
        to: MatchStatus,
    },

    /// Record store backend error
    #[error("record store '{store}' error: {message}")]
    RecordStore { store: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload validation error
    pub fn payload_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create store write error
    pub fn store_write(match_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            match_id: match_id.into(),
            message: message.into(),
        }
    }

    /// Create store query error
    pub fn store_query(match_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreQuery {
            match_id: match_id.into(),
            message: message.into(),
        }
    }

    /// Create record store error
    pub fn record_store(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordStore {
            store: store.into(),
            message: message.into(),
        }
    }
}
