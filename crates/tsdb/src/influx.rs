//! InfluxDB v2 store
//!
//! Writes line protocol to `/api/v2/write` with millisecond precision,
//! queries with Flux through `/api/v2/query` and deletes through
//! `/api/v2/delete`.

use chrono::{SecondsFormat, Utc};
use contracts::{
    ContractError, EntityKind, MatchId, Point, SampleRow, StoreConfig, TimeSeriesQuery,
    TimeSeriesWrite,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{Result, TsdbError};
use crate::{flux, line_protocol};

/// Connection settings
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    pub timeout: Duration,
}

impl InfluxConfig {
    /// Extract connection settings from the store section
    pub fn from_store_config(config: &StoreConfig) -> std::result::Result<Self, ContractError> {
        let required = |value: &Option<String>, field: &str| {
            value.clone().filter(|v| !v.is_empty()).ok_or_else(|| {
                ContractError::config_validation(
                    format!("store.{field}"),
                    "required for influx backend",
                )
            })
        };
        Ok(Self {
            url: required(&config.url, "url")?.trim_end_matches('/').to_string(),
            token: required(&config.token, "token")?,
            org: required(&config.org, "org")?,
            bucket: required(&config.bucket, "bucket")?,
            measurement: config.measurement.clone(),
            timeout: config.request_timeout(),
        })
    }
}

/// InfluxDB v2 store
#[derive(Clone)]
pub struct InfluxStore {
    client: Client,
    config: InfluxConfig,
}

impl InfluxStore {
    /// Build the HTTP client; does not contact the server
    pub fn new(config: InfluxConfig) -> std::result::Result<Self, ContractError> {
        let client = Client::builder()
            .user_agent(concat!("statpadel/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::StoreConnection {
                message: format!("build http client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{path}", self.config.url))
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TsdbError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }

    async fn query(&self, flux: String) -> Result<Vec<flux::Row>> {
        let request = self
            .post("/api/v2/query")
            .query(&[("org", self.config.org.as_str())])
            .header(CONTENT_TYPE, "application/vnd.flux")
            .header(ACCEPT, "application/csv")
            .body(flux);
        let body = self.send(request).await?;
        flux::parse_csv(&body)
    }
}

/// Pull `message` out of an InfluxDB JSON error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl TimeSeriesWrite for InfluxStore {
    #[instrument(name = "influx_write", skip(self, points), fields(points = points.len()))]
    async fn write_points(&self, points: &[Point]) -> std::result::Result<(), ContractError> {
        let Some(first) = points.first() else {
            return Ok(());
        };
        let body = line_protocol::encode_batch(&self.config.measurement, points);
        let request = self
            .post("/api/v2/write")
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ms"),
            ])
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body);
        self.send(request)
            .await
            .map_err(|e| e.into_write_error(&first.match_id))?;
        debug!("batch accepted");
        Ok(())
    }

    #[instrument(name = "influx_delete", skip(self), fields(match_id = %match_id))]
    async fn delete_match(&self, match_id: &MatchId) -> std::result::Result<(), ContractError> {
        let body = serde_json::json!({
            "start": "1970-01-01T00:00:00Z",
            "stop": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "predicate": flux::delete_predicate(&self.config.measurement, match_id),
        });
        let request = self
            .post("/api/v2/delete")
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
            ])
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(request)
            .await
            .map_err(|e| e.into_write_error(match_id))?;
        Ok(())
    }
}

impl TimeSeriesQuery for InfluxStore {
    #[instrument(name = "influx_count", skip(self), fields(match_id = %match_id))]
    async fn count_fields(
        &self,
        match_id: &MatchId,
        since_ms: i64,
    ) -> std::result::Result<u64, ContractError> {
        let query = flux::count_query(
            &self.config.bucket,
            &self.config.measurement,
            match_id,
            since_ms,
        );
        let rows = self
            .query(query)
            .await
            .map_err(|e| e.into_query_error(match_id))?;
        flux::sum_counts(&rows).map_err(|e| e.into_query_error(match_id))
    }

    #[instrument(name = "influx_samples", skip(self), fields(match_id = %match_id, kind = %kind))]
    async fn samples(
        &self,
        match_id: &MatchId,
        kind: EntityKind,
    ) -> std::result::Result<Vec<SampleRow>, ContractError> {
        let query =
            flux::samples_query(&self.config.bucket, &self.config.measurement, match_id, kind);
        let rows = self
            .query(query)
            .await
            .map_err(|e| e.into_query_error(match_id))?;
        let samples =
            flux::decode_samples(&rows, kind).map_err(|e| e.into_query_error(match_id))?;
        if samples.is_empty() {
            warn!("query returned no samples");
        }
        Ok(samples)
    }
}
