//! JSON file discovery and loading.
//!
//! Finds the JSON documents in a data directory, parses newline-delimited
//! event logs, and turns partitioned event frames into [`EventRecord`]s.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use stability_core::error::{Result, StabilityError};
use stability_core::models::EventRecord;
use tracing::debug;

use crate::frame::{decode_frame, value_kind, Row};

/// Source column names the aggregator depends on.
pub const COL_DATE: &str = "SQLDATE";
pub const COL_EVENT_CODE: &str = "EventCode";
pub const COL_NUM_MENTIONS: &str = "NumMentions";
pub const COL_GOLDSTEIN: &str = "GoldsteinScale";
pub const COL_AVG_TONE: &str = "AvgTone";
pub const COL_COUNTRY_CODE: &str = "ActionGeo_CountryCode";

pub const REQUIRED_EVENT_COLUMNS: &[&str] = &[
    COL_DATE,
    COL_EVENT_CODE,
    COL_NUM_MENTIONS,
    COL_GOLDSTEIN,
    COL_AVG_TONE,
    COL_COUNTRY_CODE,
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` files directly inside `dir`, sorted by path.
///
/// Fails with [`StabilityError::FileRead`] when `dir` is not a directory.
pub fn find_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(StabilityError::FileRead {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "data directory does not exist"),
        });
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}

/// Read and parse a whole JSON document.
pub fn read_json_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| StabilityError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Parse newline-delimited JSON into row objects.
///
/// Blank lines are skipped. A line that is not a JSON object fails the whole
/// document.
pub fn parse_ndjson_rows(text: &str) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(row) => rows.push(row),
            other => {
                return Err(StabilityError::UnexpectedPayload(format!(
                    "line {} is {}, expected an event object",
                    line_no + 1,
                    value_kind(&other)
                )));
            }
        }
    }
    Ok(rows)
}

/// Load the event rows of a partitioned event file.
///
/// Fails with [`StabilityError::MissingColumn`] when the file lacks any of
/// [`REQUIRED_EVENT_COLUMNS`], and with [`StabilityError::InvalidValue`] when
/// a numeric cell cannot be read. Rows whose country, event code or date is
/// `null` carry no group key and are dropped.
pub fn load_event_records(path: &Path) -> Result<Vec<EventRecord>> {
    let frame = decode_frame(read_json_file(path)?)?;

    if let Some(column) = REQUIRED_EVENT_COLUMNS
        .iter()
        .find(|c| !frame.columns.contains(**c))
    {
        return Err(StabilityError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        });
    }

    let total = frame.rows.len();
    let mut records = Vec::with_capacity(total);
    for (label, row) in &frame.rows {
        if let Some(record) = event_from_row(label, row)? {
            records.push(record);
        }
    }

    debug!(
        "File {}: {} rows, {} keyed events",
        path.display(),
        total,
        records.len()
    );

    Ok(records)
}

/// Convert one frame row to an [`EventRecord`].
///
/// Returns `Ok(None)` for rows with a `null` grouping field.
pub fn event_from_row(label: &str, row: &Row) -> Result<Option<EventRecord>> {
    let (Some(date), Some(event_code), Some(country_code)) = (
        text_cell(row, COL_DATE),
        text_cell(row, COL_EVENT_CODE),
        text_cell(row, COL_COUNTRY_CODE),
    ) else {
        return Ok(None);
    };

    Ok(Some(EventRecord {
        date,
        event_code,
        num_mentions: count_cell(label, row, COL_NUM_MENTIONS)?,
        goldstein_scale: float_cell(label, row, COL_GOLDSTEIN)?,
        avg_tone: float_cell(label, row, COL_AVG_TONE)?,
        country_code,
    }))
}

// ── Cell helpers ──────────────────────────────────────────────────────────────

/// String form of a cell; numbers are rendered as written. `None` for null or
/// absent cells.
fn text_cell(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn invalid(label: &str, column: &str, value: Option<&Value>) -> StabilityError {
    StabilityError::InvalidValue {
        column: column.to_string(),
        row: label.to_string(),
        value: value.map_or_else(|| "<absent>".to_string(), Value::to_string),
    }
}

fn float_cell(label: &str, row: &Row, column: &str) -> Result<f64> {
    let value = row.get(column);
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| invalid(label, column, value))
}

fn count_cell(label: &str, row: &Row, column: &str) -> Result<u64> {
    let value = row.get(column);
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(label, column, value))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn full_frame() -> Value {
        json!({
            "SQLDATE": {"0": 20190101, "1": "20190215", "2": 20190301},
            "EventCode": {"0": "141", "1": 1822, "2": "0231"},
            "NumMentions": {"0": 10, "1": "4", "2": 2.0},
            "GoldsteinScale": {"0": -6.5, "1": "-9.5", "2": 3},
            "AvgTone": {"0": -2.0, "1": -8.25, "2": 1.5},
            "ActionGeo_CountryCode": {"0": "FR", "1": "FR", "2": "FR"},
        })
    }

    // ── find_json_files ───────────────────────────────────────────────────────

    #[test]
    fn test_find_json_files_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("US_2020.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("FR_2019.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested").join("BR_2018.json"), "{}").unwrap();

        let files = find_json_files(tmp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["FR_2019.json", "US_2020.json"]);
    }

    #[test]
    fn test_find_json_files_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let absent = tmp.path().join("absent");
        match find_json_files(&absent).unwrap_err() {
            StabilityError::FileRead { path, source } => {
                assert_eq!(path, absent);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── parse_ndjson_rows ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let text = "{\"a\": 1}\n\n  \n{\"a\": 2}\n";
        let rows = parse_ndjson_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["a"], 2);
    }

    #[test]
    fn test_parse_ndjson_malformed_line_fails() {
        assert!(parse_ndjson_rows("{\"a\": 1}\n{oops\n").is_err());
    }

    #[test]
    fn test_parse_ndjson_non_object_line_fails() {
        let err = parse_ndjson_rows("{\"a\": 1}\n[1, 2]\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    // ── load_event_records ────────────────────────────────────────────────────

    #[test]
    fn test_load_event_records_coerces_cells() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "FR_2019.json", &full_frame());

        let records = load_event_records(&path).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].date, "20190101");
        assert_eq!(records[0].num_mentions, 10);
        assert_eq!(records[1].event_code, "1822");
        assert_eq!(records[1].num_mentions, 4);
        assert_eq!(records[1].goldstein_scale, -9.5);
        assert_eq!(records[2].event_code, "0231");
        assert_eq!(records[2].num_mentions, 2);
        assert_eq!(records[2].goldstein_scale, 3.0);
        assert!(records.iter().all(|r| r.year() == Some(2019)));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut frame = full_frame();
        frame.as_object_mut().unwrap().remove("AvgTone");
        let path = write(tmp.path(), "FR_2019.json", &frame);

        match load_event_records(&path).unwrap_err() {
            StabilityError::MissingColumn { column, .. } => assert_eq!(column, "AvgTone"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_frame_with_columns_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let frame = json!({
            "SQLDATE": {}, "EventCode": {}, "NumMentions": {},
            "GoldsteinScale": {}, "AvgTone": {}, "ActionGeo_CountryCode": {},
        });
        let path = write(tmp.path(), "IR_2016.json", &frame);
        assert!(load_event_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_numeric_cell_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut frame = full_frame();
        frame["GoldsteinScale"]["1"] = json!("strong");
        let path = write(tmp.path(), "FR_2019.json", &frame);

        match load_event_records(&path).unwrap_err() {
            StabilityError::InvalidValue { column, row, .. } => {
                assert_eq!(column, "GoldsteinScale");
                assert_eq!(row, "1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_country_row_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let mut frame = full_frame();
        frame["ActionGeo_CountryCode"]["2"] = Value::Null;
        let path = write(tmp.path(), "FR_2019.json", &frame);
        assert_eq!(load_event_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_records_array_document() {
        let tmp = TempDir::new().unwrap();
        let doc = json!([{
            "SQLDATE": 20200704, "EventCode": "145", "NumMentions": 7,
            "GoldsteinScale": -10.0, "AvgTone": -5.0, "ActionGeo_CountryCode": "US",
        }]);
        let path = write(tmp.path(), "US_2020.json", &doc);
        let records = load_event_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country_code, "US");
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let err = load_event_records(&tmp.path().join("none.json")).unwrap_err();
        assert!(err.to_string().contains("none.json"));
    }
}
