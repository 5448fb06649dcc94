//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Written points did not become observable in time
    #[error(
        "visibility timeout for match '{match_id}': observed {observed}/{expected} after {attempts} attempts"
    )]
    VisibilityTimeout {
        /// Match ID
        match_id: String,
        /// Last count returned by the store
        observed: u64,
        /// Count the writer reported
        expected: u64,
        /// Count queries issued
        attempts: u32,
    },

    /// Nothing was confirmed written, so there is nothing to wait for
    #[error("no points confirmed written for match '{match_id}'")]
    NothingWritten {
        /// Match ID
        match_id: String,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
