//! Column-oriented JSON frames.
//!
//! Partitioned event files use the layout
//! `{"<column>": {"<row index>": <value>, ...}, ...}`, where the row index is
//! the row's position in the blob it came from. This module writes that
//! layout straight from borrowed rows and reads it (or a plain array of row
//! objects) back into rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use stability_core::error::{Result, StabilityError};

/// One event row as a JSON object.
pub type Row = Map<String, Value>;

/// A row tagged with its index in the source.
pub type IndexedRow<'a> = (usize, &'a Row);

// ── Writing ───────────────────────────────────────────────────────────────────

/// Borrowed view of a set of rows that serializes in the columnar layout.
///
/// Every entry of `columns` is written, even when `rows` is empty. A row
/// without a value for a column is written as `null`.
pub struct ColumnarFrame<'a> {
    columns: &'a [String],
    rows: &'a [IndexedRow<'a>],
}

impl<'a> ColumnarFrame<'a> {
    pub fn new(columns: &'a [String], rows: &'a [IndexedRow<'a>]) -> Self {
        Self { columns, rows }
    }

    /// Serialized JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

struct ColumnValues<'a> {
    column: &'a str,
    rows: &'a [IndexedRow<'a>],
}

impl Serialize for ColumnarFrame<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(
                column,
                &ColumnValues {
                    column,
                    rows: self.rows,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for ColumnValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (index, row) in self.rows {
            map.serialize_entry(
                &index.to_string(),
                row.get(self.column).unwrap_or(&Value::Null),
            )?;
        }
        map.end()
    }
}

/// Union of the keys of `rows`, in first-seen order.
pub fn collect_columns<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Rows decoded from a frame document, with the column set it declared.
#[derive(Debug, Clone, Default)]
pub struct DecodedFrame {
    pub columns: BTreeSet<String>,
    /// `(row label, row)` pairs ordered by label (numerically when possible).
    pub rows: Vec<(String, Row)>,
}

/// Decode either a columnar frame object or an array of row objects.
pub fn decode_frame(document: Value) -> Result<DecodedFrame> {
    match document {
        Value::Object(columns) => decode_columnar(columns),
        Value::Array(items) => decode_records(items),
        other => Err(StabilityError::UnexpectedPayload(format!(
            "expected a JSON object or array frame, found {}",
            value_kind(&other)
        ))),
    }
}

fn decode_columnar(columns: Map<String, Value>) -> Result<DecodedFrame> {
    let mut names = BTreeSet::new();
    let mut rows: BTreeMap<RowLabel, Row> = BTreeMap::new();

    for (column, cells) in columns {
        let Value::Object(cells) = cells else {
            return Err(StabilityError::UnexpectedPayload(format!(
                "column '{column}' is not an object of row values"
            )));
        };
        for (label, value) in cells {
            rows.entry(RowLabel::new(label))
                .or_default()
                .insert(column.clone(), value);
        }
        names.insert(column);
    }

    Ok(DecodedFrame {
        columns: names,
        rows: rows.into_iter().map(|(label, row)| (label.text, row)).collect(),
    })
}

fn decode_records(items: Vec<Value>) -> Result<DecodedFrame> {
    let mut frame = DecodedFrame::default();
    for (i, item) in items.into_iter().enumerate() {
        let row = match item {
            Value::Object(row) => row,
            other => {
                return Err(StabilityError::UnexpectedPayload(format!(
                    "record {i} is {}, expected an object",
                    value_kind(&other)
                )));
            }
        };
        frame.columns.extend(row.keys().cloned());
        frame.rows.push((i.to_string(), row));
    }
    Ok(frame)
}

/// Row label that sorts numeric labels by value, after any non-numeric ones.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RowLabel {
    numeric: Option<u64>,
    text: String,
}

impl RowLabel {
    fn new(text: String) -> Self {
        Self {
            numeric: text.parse().ok(),
            text,
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
