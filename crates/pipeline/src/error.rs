//! Pipeline error types

use analytics::AnalyticsError;
use contracts::ContractError;
use ingestion::IngestionError;
use thiserror::Error;

/// Error that aborts one match orchestration
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Write or visibility wait failed
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// An aggregation failed
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Record store or store access failed
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl PipelineError {
    /// Whether the store never showed the written points in time
    pub fn is_visibility_timeout(&self) -> bool {
        matches!(
            self,
            Self::Ingestion(IngestionError::VisibilityTimeout { .. })
        )
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, PipelineError>;
