//! FileMatchStore - one JSON document per match
//!
//! `<base_path>/<escaped match id>.json`, replaced atomically through a
//! temporary file on every change.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use contracts::{
    AnalysisResult, ContractError, MatchId, MatchRecord, MatchRecordStore, MatchStatus,
};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use crate::{not_found, Change};

const STORE_NAME: &str = "file";

/// Record store backed by a directory of JSON files
pub struct FileMatchStore {
    base_path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileMatchStore {
    /// Create the store, creating `base_path` if needed
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Location of a match document
    pub fn record_path(&self, match_id: &MatchId) -> PathBuf {
        self.base_path.join(format!("{}.json", escape_file_name(match_id.as_str())))
    }

    async fn read(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, ContractError> {
        let path = self.record_path(match_id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            error!(path = %path.display(), error = %e, "corrupt match record");
            ContractError::record_store(STORE_NAME, format!("{}: {e}", path.display()))
        })
    }

    async fn write(&self, record: &MatchRecord) -> Result<(), ContractError> {
        let path = self.record_path(&record.match_id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| ContractError::record_store(STORE_NAME, e.to_string()))?;
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), status = %record.status, "record written");
        Ok(())
    }

    async fn update(&self, match_id: &MatchId, change: Change<'_>) -> Result<(), ContractError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read(match_id).await?.ok_or_else(|| not_found(match_id))?;
        change.apply(&mut record)?;
        self.write(&record).await
    }
}

/// Keep `[A-Za-z0-9._-]`, percent-encode every other byte
fn escape_file_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && !out.is_empty());
        if keep {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

impl MatchRecordStore for FileMatchStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    #[instrument(name = "file_records_register", skip(self), fields(match_id = %match_id))]
    async fn register(&self, match_id: &MatchId) -> Result<MatchRecord, ContractError> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read(match_id).await? {
            return Ok(existing);
        }
        let record = MatchRecord::new(match_id.clone());
        self.write(&record).await?;
        Ok(record)
    }

    #[instrument(name = "file_records_load", skip(self), fields(match_id = %match_id))]
    async fn load(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, ContractError> {
        self.read(match_id).await
    }

    #[instrument(
        name = "file_records_set_status",
        skip(self),
        fields(match_id = %match_id, status = %status)
    )]
    async fn set_status(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
    ) -> Result<(), ContractError> {
        self.update(match_id, Change::Status(status)).await
    }

    #[instrument(
        name = "file_records_store_analysis",
        skip(self, analysis),
        fields(match_id = %match_id)
    )]
    async fn store_analysis(
        &self,
        match_id: &MatchId,
        analysis: &AnalysisResult,
    ) -> Result<(), ContractError> {
        self.update(match_id, Change::Analysis(analysis)).await
    }

    #[instrument(name = "file_records_mark_failed", skip(self), fields(match_id = %match_id))]
    async fn mark_failed(&self, match_id: &MatchId, message: &str) -> Result<(), ContractError> {
        self.update(match_id, Change::Failed(message)).await
    }
}
