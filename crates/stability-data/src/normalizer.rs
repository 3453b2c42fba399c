//! Flattening of World Bank API responses.
//!
//! The API answers with `[metadata, records]`, where each record nests the
//! country and indicator as `{"id": ..., "value": ...}` objects. Records are
//! flattened into dotted keys (`country.id`, `indicator.value`, ...) and then
//! read into [`IndicatorRecord`]s.

use std::path::Path;

use serde_json::{Map, Value};
use stability_core::error::{Result, StabilityError};
use stability_core::models::IndicatorRecord;
use tracing::debug;

use crate::reader::{find_json_files, read_json_file};

/// Flatten nested objects into a single level with `.`-joined keys.
///
/// Arrays and scalars are kept as leaf values.
pub fn flatten_record(record: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Value::Object(map) = record {
        flatten_into(&mut flat, None, map);
    }
    flat
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}

/// The record array of an API response.
///
/// A `null` record slot (no data for the range) yields an empty slice. A
/// single-element response is the API's error envelope and is rejected.
pub fn response_records(response: &Value) -> Result<&[Value]> {
    let Value::Array(parts) = response else {
        return Err(StabilityError::UnexpectedPayload(
            "indicator response is not a JSON array".to_string(),
        ));
    };
    match parts.get(1) {
        Some(Value::Array(records)) => Ok(records),
        Some(Value::Null) => Ok(&[]),
        Some(_) => Err(StabilityError::UnexpectedPayload(
            "indicator records are not an array".to_string(),
        )),
        None => Err(StabilityError::UnexpectedPayload(format!(
            "indicator response has no record list: {}",
            parts.first().map(Value::to_string).unwrap_or_default()
        ))),
    }
}

/// Flattened rows of an API response.
pub fn flatten_response(response: &Value) -> Result<Vec<Map<String, Value>>> {
    Ok(response_records(response)?
        .iter()
        .map(flatten_record)
        .collect())
}

/// Read a flattened row into an [`IndicatorRecord`].
pub fn indicator_from_flat(row: &Map<String, Value>) -> Result<IndicatorRecord> {
    let text = |key: &str| -> Result<String> {
        row.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StabilityError::InvalidValue {
                column: key.to_string(),
                row: row_label(row),
                value: row.get(key).map(Value::to_string).unwrap_or_default(),
            })
    };

    let date = text("date")?;
    let year = date
        .get(..4)
        .and_then(|y| y.parse().ok())
        .ok_or_else(|| StabilityError::InvalidValue {
            column: "date".to_string(),
            row: row_label(row),
            value: date.clone(),
        })?;

    let value = match row.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => {
            return Err(StabilityError::InvalidValue {
                column: "value".to_string(),
                row: row_label(row),
                value: other.to_string(),
            })
        }
    };

    Ok(IndicatorRecord {
        country_id: text("country.id")?,
        indicator_id: text("indicator.id")?,
        year,
        value,
    })
}

fn row_label(row: &Map<String, Value>) -> String {
    let field = |key: &str| row.get(key).and_then(Value::as_str).unwrap_or("?");
    format!("{}/{}/{}", field("country.id"), field("indicator.id"), field("date"))
}

/// Typed records of an API response.
pub fn normalize_response(response: &Value) -> Result<Vec<IndicatorRecord>> {
    flatten_response(response)?
        .iter()
        .map(indicator_from_flat)
        .collect()
}

/// Read a saved API snapshot and flatten its records.
pub fn process_file(path: &Path) -> Result<Vec<Map<String, Value>>> {
    flatten_response(&read_json_file(path)?)
}

/// Read a saved API snapshot into typed records.
pub fn normalize_file(path: &Path) -> Result<Vec<IndicatorRecord>> {
    normalize_response(&read_json_file(path)?)
}

/// Typed records of every snapshot in `dir`, in file-name order.
pub fn normalize_directory(dir: &Path) -> Result<Vec<IndicatorRecord>> {
    let files = find_json_files(dir)?;
    let mut records = Vec::new();
    for path in &files {
        let file_records = normalize_file(path)?;
        debug!("File {}: {} indicator records", path.display(), file_records.len());
        records.extend(file_records);
    }
    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
