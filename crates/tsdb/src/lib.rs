//! # TSDB
//!
//! Time-series store backends for tracking points.
//!
//! Responsibilities:
//! - Implement `TimeSeriesWrite` / `TimeSeriesQuery` from `contracts`
//! - Provide an in-process store with delayed visibility and fault injection
//! - Provide an InfluxDB v2 store (line protocol writes, Flux queries)
//!
//! ## Feature Flags
//!
//! - `influx`: Enable the InfluxDB store (requires reqwest)

pub mod error;
pub mod flux;
pub mod line_protocol;
pub mod memory;
mod store;

#[cfg(feature = "influx")]
pub mod influx;

pub use error::{Result, TsdbError};
pub use memory::{MemoryStore, MemoryStoreConfig};
pub use store::Store;

#[cfg(feature = "influx")]
pub use influx::{InfluxConfig, InfluxStore};
