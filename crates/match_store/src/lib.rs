//! # Match Store
//!
//! Match record stores: status, analysis result and last error per match.
//!
//! - `InMemoryMatchStore`: process-local map
//! - `FileMatchStore`: one JSON document per match under a directory
//!
//! Both enforce the status machine from `MatchStatus::can_transition_to`.

mod file;
mod memory;

pub use file::FileMatchStore;
pub use memory::InMemoryMatchStore;

use chrono::Utc;
use contracts::{
    AnalysisResult, ContractError, MatchId, MatchRecord, MatchRecordStore, MatchStatus,
    RecordsBackend, RecordsConfig,
};

/// Record store chosen at runtime from `[records] backend`
pub enum Records {
    Memory(InMemoryMatchStore),
    File(FileMatchStore),
}

impl Records {
    pub fn from_config(config: &RecordsConfig) -> Result<Self, ContractError> {
        match config.backend {
            RecordsBackend::Memory => Ok(Self::Memory(InMemoryMatchStore::new())),
            RecordsBackend::File => {
                let path = config.path.clone().ok_or_else(|| {
                    ContractError::config_validation("records.path", "required for file backend")
                })?;
                Ok(Self::File(FileMatchStore::new(path)?))
            }
        }
    }
}

impl MatchRecordStore for Records {
    fn name(&self) -> &str {
        match self {
            Self::Memory(s) => s.name(),
            Self::File(s) => s.name(),
        }
    }

    async fn register(&self, match_id: &MatchId) -> Result<MatchRecord, ContractError> {
        match self {
            Self::Memory(s) => s.register(match_id).await,
            Self::File(s) => s.register(match_id).await,
        }
    }

    async fn load(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, ContractError> {
        match self {
            Self::Memory(s) => s.load(match_id).await,
            Self::File(s) => s.load(match_id).await,
        }
    }

    async fn set_status(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
    ) -> Result<(), ContractError> {
        match self {
            Self::Memory(s) => s.set_status(match_id, status).await,
            Self::File(s) => s.set_status(match_id, status).await,
        }
    }

    async fn store_analysis(
        &self,
        match_id: &MatchId,
        analysis: &AnalysisResult,
    ) -> Result<(), ContractError> {
        match self {
            Self::Memory(s) => s.store_analysis(match_id, analysis).await,
            Self::File(s) => s.store_analysis(match_id, analysis).await,
        }
    }

    async fn mark_failed(&self, match_id: &MatchId, message: &str) -> Result<(), ContractError> {
        match self {
            Self::Memory(s) => s.mark_failed(match_id, message).await,
            Self::File(s) => s.mark_failed(match_id, message).await,
        }
    }
}

/// Record mutation shared by the backends
pub(crate) enum Change<'a> {
    Status(MatchStatus),
    Analysis(&'a AnalysisResult),
    Failed(&'a str),
}

impl Change<'_> {
    fn target(&self) -> MatchStatus {
        match self {
            Self::Status(status) => *status,
            Self::Analysis(_) => MatchStatus::Analyzed,
            Self::Failed(_) => MatchStatus::Failed,
        }
    }

    /// Apply to `record` if the status machine allows it
    pub(crate) fn apply(self, record: &mut MatchRecord) -> Result<(), ContractError> {
        let to = self.target();
        if !record.status.can_transition_to(to) {
            return Err(ContractError::InvalidTransition {
                match_id: record.match_id.to_string(),
                from: record.status,
                to,
            });
        }
        match self {
            Self::Status(MatchStatus::Analyzing) => record.error = None,
            Self::Status(_) => {}
            Self::Analysis(analysis) => {
                record.analysis = Some(analysis.clone());
                record.error = None;
            }
            Self::Failed(message) => record.error = Some(message.to_string()),
        }
        record.status = to;
        record.updated_at = Utc::now();
        Ok(())
    }
}

pub(crate) fn not_found(match_id: &MatchId) -> ContractError {
    ContractError::MatchNotFound {
        match_id: match_id.to_string(),
    }
}
