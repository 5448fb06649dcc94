//! Analytics error types

use contracts::ContractError;
use thiserror::Error;

/// Analytics error
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Data needed for an aggregate is absent from the store
    #[error("missing data for match '{match_id}': {message}")]
    DataMissing { match_id: String, message: String },

    /// Wrapped ContractError (store queries)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, AnalyticsError>;
