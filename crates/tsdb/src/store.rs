//! Backend selection from configuration

use contracts::{
    ContractError, EntityKind, MatchId, Point, SampleRow, StoreBackend, StoreConfig,
    TimeSeriesQuery, TimeSeriesWrite,
};
use tracing::info;

use crate::memory::{MemoryStore, MemoryStoreConfig};

#[cfg(feature = "influx")]
use crate::influx::{InfluxConfig, InfluxStore};

/// Store chosen at runtime from `[store] backend`
pub enum Store {
    Memory(MemoryStore),
    #[cfg(feature = "influx")]
    Influx(InfluxStore),
}

impl Store {
    /// Build the configured backend
    pub fn from_config(config: &StoreConfig) -> Result<Self, ContractError> {
        match config.backend {
            StoreBackend::Memory => {
                info!(delay_ms = config.visibility_delay_ms, "using in-memory store");
                Ok(Self::Memory(MemoryStore::with_config(MemoryStoreConfig {
                    visibility_delay: config.visibility_delay(),
                    ..Default::default()
                })))
            }
            #[cfg(feature = "influx")]
            StoreBackend::Influx => {
                let influx = InfluxConfig::from_store_config(config)?;
                info!(url = %influx.url, bucket = %influx.bucket, "using InfluxDB store");
                Ok(Self::Influx(InfluxStore::new(influx)?))
            }
            #[cfg(not(feature = "influx"))]
            StoreBackend::Influx => Err(ContractError::config_validation(
                "store.backend",
                "built without the `influx` feature",
            )),
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Memory(_) => StoreBackend::Memory,
            #[cfg(feature = "influx")]
            Self::Influx(_) => StoreBackend::Influx,
        }
    }
}

impl TimeSeriesWrite for Store {
    async fn write_points(&self, points: &[Point]) -> Result<(), ContractError> {
        match self {
            Self::Memory(s) => s.write_points(points).await,
            #[cfg(feature = "influx")]
            Self::Influx(s) => s.write_points(points).await,
        }
    }

    async fn delete_match(&self, match_id: &MatchId) -> Result<(), ContractError> {
        match self {
            Self::Memory(s) => s.delete_match(match_id).await,
            #[cfg(feature = "influx")]
            Self::Influx(s) => s.delete_match(match_id).await,
        }
    }
}

impl TimeSeriesQuery for Store {
    async fn count_fields(&self, match_id: &MatchId, since_ms: i64) -> Result<u64, ContractError> {
        match self {
            Self::Memory(s) => s.count_fields(match_id, since_ms).await,
            #[cfg(feature = "influx")]
            Self::Influx(s) => s.count_fields(match_id, since_ms).await,
        }
    }

    async fn samples(
        &self,
        match_id: &MatchId,
        kind: EntityKind,
    ) -> Result<Vec<SampleRow>, ContractError> {
        match self {
            Self::Memory(s) => s.samples(match_id, kind).await,
            #[cfg(feature = "influx")]
            Self::Influx(s) => s.samples(match_id, kind).await,
        }
    }
}
