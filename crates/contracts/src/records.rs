//! MatchRecordStore trait - where finished analyses are kept
//!
//! Owns the match status. The pipeline drives the status but never
//! stores records itself.

use crate::{AnalysisResult, ContractError, MatchId, MatchRecord, MatchStatus};

/// Match record store
///
/// All record store implementations must implement this trait.
#[trait_variant::make(MatchRecordStore: Send)]
pub trait LocalMatchRecordStore {
    /// Store name (used for logging)
    fn name(&self) -> &str;

    /// Create a `pending` record, or return the existing one
    async fn register(&self, match_id: &MatchId) -> Result<MatchRecord, ContractError>;

    /// Fetch a record
    async fn load(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, ContractError>;

    /// Move a record to `status`
    ///
    /// # Errors
    /// `MatchNotFound` for unknown ids, `InvalidTransition` when the state
    /// machine forbids the change.
    async fn set_status(&self, match_id: &MatchId, status: MatchStatus)
        -> Result<(), ContractError>;

    /// Attach the analysis and move the record to `analyzed`
    async fn store_analysis(
        &self,
        match_id: &MatchId,
        analysis: &AnalysisResult,
    ) -> Result<(), ContractError>;

    /// Record the error and move the record to `failed`
    async fn mark_failed(&self, match_id: &MatchId, message: &str) -> Result<(), ContractError>;
}
