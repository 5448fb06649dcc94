//! TSDB error types

use contracts::{ContractError, MatchId};
use thiserror::Error;

/// Store backend specific error
#[derive(Debug, Error)]
pub enum TsdbError {
    /// Transport level failure (connect, timeout, body read)
    #[error("request failed: {message}")]
    Request { message: String },

    /// Server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body could not be decoded
    #[error("malformed response at line {line}: {message}")]
    Decode { line: usize, message: String },

    /// Injected failure (memory store)
    #[error("injected failure: {0}")]
    Injected(String),

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl TsdbError {
    /// Create decode error
    pub fn decode(line: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            line,
            message: message.into(),
        }
    }

    /// Attribute this error to a write of `match_id`
    pub fn into_write_error(self, match_id: &MatchId) -> ContractError {
        match self {
            Self::Contract(e) => e,
            other => ContractError::store_write(match_id.as_str(), other.to_string()),
        }
    }

    /// Attribute this error to a query of `match_id`
    pub fn into_query_error(self, match_id: &MatchId) -> ContractError {
        match self {
            Self::Contract(e) => e,
            other => ContractError::store_query(match_id.as_str(), other.to_string()),
        }
    }
}

#[cfg(feature = "influx")]
impl From<reqwest::Error> for TsdbError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Request {
                message: e.to_string(),
            },
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, TsdbError>;
