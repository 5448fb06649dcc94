//! In-memory match record store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{
    AnalysisResult, ContractError, MatchId, MatchRecord, MatchRecordStore, MatchStatus,
};
use tracing::{debug, instrument};

use crate::{not_found, Change};

/// Process-local record store
#[derive(Default)]
pub struct InMemoryMatchStore {
    records: Mutex<HashMap<MatchId, MatchRecord>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MatchId, MatchRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, match_id: &MatchId, change: Change<'_>) -> Result<(), ContractError> {
        let mut records = self.lock();
        let record = records.get_mut(match_id).ok_or_else(|| not_found(match_id))?;
        change.apply(record)?;
        debug!(match_id = %match_id, status = %record.status, "record updated");
        Ok(())
    }
}

impl MatchRecordStore for InMemoryMatchStore {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(name = "memory_records_register", skip(self), fields(match_id = %match_id))]
    async fn register(&self, match_id: &MatchId) -> Result<MatchRecord, ContractError> {
        Ok(self
            .lock()
            .entry(match_id.clone())
            .or_insert_with(|| MatchRecord::new(match_id.clone()))
            .clone())
    }

    async fn load(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, ContractError> {
        Ok(self.lock().get(match_id).cloned())
    }

    #[instrument(
        name = "memory_records_set_status",
        skip(self),
        fields(match_id = %match_id, status = %status)
    )]
    async fn set_status(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
    ) -> Result<(), ContractError> {
        self.update(match_id, Change::Status(status))
    }

    #[instrument(
        name = "memory_records_store_analysis",
        skip(self, analysis),
        fields(match_id = %match_id)
    )]
    async fn store_analysis(
        &self,
        match_id: &MatchId,
        analysis: &AnalysisResult,
    ) -> Result<(), ContractError> {
        self.update(match_id, Change::Analysis(analysis))
    }

    #[instrument(name = "memory_records_mark_failed", skip(self), fields(match_id = %match_id))]
    async fn mark_failed(&self, match_id: &MatchId, message: &str) -> Result<(), ContractError> {
        self.update(match_id, Change::Failed(message))
    }
}
