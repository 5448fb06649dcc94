//! Flux query builders and CSV response decoding

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat};
use contracts::{Entity, EntityKind, MatchId, PlayerSlot, Sample, SampleRow};
use contracts::{FIELD_X, FIELD_Y, TAG_ENTITY, TAG_MATCH_ID, TAG_PLAYER_SLOT};

use crate::error::{Result, TsdbError};

/// Column holding the point time
const TIME_COLUMN: &str = "_time";
/// Column holding the aggregated value
const VALUE_COLUMN: &str = "_value";

/// Count of field values for a match at or after `since_ms`
pub fn count_query(bucket: &str, measurement: &str, match_id: &MatchId, since_ms: i64) -> String {
    let start = DateTime::from_timestamp_millis(since_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: {start})
  |> filter(fn: (r) => r._measurement == "{measurement}" and r.{TAG_MATCH_ID} == "{id}")
  |> count()"#,
        bucket = escape_string(bucket),
        measurement = escape_string(measurement),
        id = escape_string(match_id.as_str()),
    )
}

/// Position samples of one entity kind, pivoted to one row per instant
pub fn samples_query(
    bucket: &str,
    measurement: &str,
    match_id: &MatchId,
    kind: EntityKind,
) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: 0)
  |> filter(fn: (r) => r._measurement == "{measurement}" and r.{TAG_MATCH_ID} == "{id}" and r.{TAG_ENTITY} == "{kind}")
  |> filter(fn: (r) => r._field == "{FIELD_X}" or r._field == "{FIELD_Y}")
  |> pivot(rowKey: ["_time"], columnKey: ["_field"], valueColumn: "_value")
  |> keep(columns: ["_time", "{TAG_PLAYER_SLOT}", "{FIELD_X}", "{FIELD_Y}"])"#,
        bucket = escape_string(bucket),
        measurement = escape_string(measurement),
        id = escape_string(match_id.as_str()),
        kind = kind.as_str(),
    )
}

/// Delete predicate selecting every point of a match
pub fn delete_predicate(measurement: &str, match_id: &MatchId) -> String {
    format!(
        r#"_measurement="{}" AND {TAG_MATCH_ID}="{}""#,
        escape_string(measurement),
        escape_string(match_id.as_str())
    )
}

fn escape_string(raw: &str) -> String {
    raw.replace('\\', r"\\").replace('"', "\\\"")
}

/// One CSV record keyed by column name
pub type Row = HashMap<String, String>;

/// Header cell that opens every table of a Flux response
const RESULT_COLUMN: &str = "result";

/// Decode an InfluxDB annotated CSV response.
///
/// Annotation rows (`#...`) and blank lines are skipped. A record whose
/// first data column is `result` starts a new table and becomes the header
/// for the rows after it.
pub fn parse_csv(body: &str) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .flexible(true)
        .has_headers(false)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    let mut header: Option<csv::StringRecord> = None;

    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line() as usize);
            TsdbError::decode(line, e.to_string())
        })?;
        if record.get(1) == Some(RESULT_COLUMN) {
            header = Some(record);
            continue;
        }
        let Some(columns) = &header else {
            let line = record.position().map_or(0, |p| p.line() as usize);
            return Err(TsdbError::decode(line, "data row before table header"));
        };
        rows.push(
            columns
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

/// Sum the `_value` column of a `count()` response
pub fn sum_counts(rows: &[Row]) -> Result<u64> {
    rows.iter().enumerate().try_fold(0u64, |total, (i, row)| {
        let value = column(row, VALUE_COLUMN, i)?;
        let count: u64 = value
            .parse()
            .map_err(|_| TsdbError::decode(i, format!("count '{value}' is not an integer")))?;
        Ok(total + count)
    })
}

/// Turn pivoted rows into sample rows
pub fn decode_samples(rows: &[Row], kind: EntityKind) -> Result<Vec<SampleRow>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let entity = match kind {
                EntityKind::Ball => Entity::Ball,
                EntityKind::Player => {
                    let slot = column(row, TAG_PLAYER_SLOT, i)?;
                    let slot: PlayerSlot = slot
                        .parse()
                        .map_err(|_| {
                            TsdbError::decode(i, format!("unknown player slot '{slot}'"))
                        })?;
                    Entity::Player(slot)
                }
            };
            let time = column(row, TIME_COLUMN, i)?;
            let timestamp_ms = DateTime::parse_from_rfc3339(time)
                .map_err(|e| TsdbError::decode(i, format!("bad time '{time}': {e}")))?
                .timestamp_millis();
            let x = float_column(row, FIELD_X, i)?;
            let y = float_column(row, FIELD_Y, i)?;
            Ok(SampleRow {
                entity,
                sample: Sample::new(timestamp_ms, x, y),
            })
        })
        .collect()
}

fn column<'a>(row: &'a Row, name: &str, line: usize) -> Result<&'a str> {
    row.get(name)
        .map(String::as_str)
        .ok_or_else(|| TsdbError::decode(line, format!("missing column '{name}'")))
}

fn float_column(row: &Row, name: &str, line: usize) -> Result<f64> {
    let raw = column(row, name, line)?;
    raw.parse()
        .map_err(|_| TsdbError::decode(line, format!("{name} '{raw}' is not a number")))
}
