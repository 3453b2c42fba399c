//! Splitting of yearly GDELT event logs into per-country files.
//!
//! Each blob holds one year of events as newline-delimited JSON. For every
//! requested country the matching rows are written as a columnar frame; when
//! that frame would exceed the size ceiling the rows are cut into contiguous
//! parts, each written to its own numbered file.

use std::ops::Range;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use stability_core::error::{Result, StabilityError};
use tracing::{debug, info};

use crate::frame::{collect_columns, ColumnarFrame, IndexedRow, Row};
use crate::reader::{parse_ndjson_rows, COL_COUNTRY_CODE};

/// Column removed from every partition file.
pub const DROPPED_COLUMN: &str = "ActionGeo_FullName";

// ── Blob sources ──────────────────────────────────────────────────────────────

/// A store of yearly event-log blobs named `{prefix}_{year}.{ext}`.
pub trait BlobSource {
    /// Names of all blobs, in the order they should be processed.
    fn list_blobs(&self) -> Result<Vec<String>>;

    /// Full text content of the named blob.
    fn download_text(&self, name: &str) -> Result<String>;
}

/// Blobs stored as files directly inside a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryBlobSource {
    dir: PathBuf,
}

impl DirectoryBlobSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BlobSource for DirectoryBlobSource {
    fn list_blobs(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StabilityError::FileRead {
                path: self.dir.clone(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn download_text(&self, name: &str) -> Result<String> {
        let path = self.dir.join(name);
        std::fs::read_to_string(&path).map_err(|source| StabilityError::FileRead { path, source })
    }
}

/// Year encoded in a blob name such as `events_2019.json`.
pub fn year_from_blob_name(name: &str) -> Result<i32> {
    let re = Regex::new(r"_(\d{4})\.[^./_]+$").expect("regex is valid");
    re.captures(name)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| StabilityError::BlobName(name.to_string()))
}

// ── Partition planning ────────────────────────────────────────────────────────

/// Contiguous row ranges for a country-year of `row_count` rows whose frame
/// serializes to `serialized_size` bytes.
///
/// At or below `threshold` the whole set is one range. Above it the rows are
/// cut into `ceil(size / threshold)` ranges of `row_count / parts` rows; the
/// last range runs to `row_count` so remainder rows are kept. The part count
/// never exceeds the row count.
pub fn plan_parts(row_count: usize, serialized_size: u64, threshold: u64) -> Vec<Range<usize>> {
    if serialized_size <= threshold || row_count <= 1 {
        return vec![0..row_count];
    }

    let parts = serialized_size.div_ceil(threshold.max(1));
    let parts = usize::try_from(parts).unwrap_or(usize::MAX).min(row_count);
    let chunk = row_count / parts;

    (0..parts)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 == parts { row_count } else { start + chunk };
            start..end
        })
        .collect()
}

/// File name for a country-year, with the 1-based part number when split.
pub fn partition_file_name(country: &str, year: i32, part: Option<usize>) -> String {
    match part {
        Some(n) => format!("{country}_{year}({n}).json"),
        None => format!("{country}_{year}.json"),
    }
}

// ── Partitioning ──────────────────────────────────────────────────────────────

/// One file written by the partitioner.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFile {
    pub country: String,
    pub year: i32,
    /// 1-based part number; `None` when the country-year fits in one file.
    pub part: Option<usize>,
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

/// Write the rows of one year's blob, split by country, into `output_dir`.
pub fn partition_rows(
    rows: &[Row],
    year: i32,
    countries: &[String],
    threshold: u64,
    output_dir: &Path,
) -> Result<Vec<PartitionFile>> {
    std::fs::create_dir_all(output_dir).map_err(|source| StabilityError::FileWrite {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let columns: Vec<String> = collect_columns(rows)
        .into_iter()
        .filter(|c| c != DROPPED_COLUMN)
        .collect();

    let mut written = Vec::new();
    for country in countries {
        let selected: Vec<IndexedRow> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.get(COL_COUNTRY_CODE).and_then(Value::as_str) == Some(country.as_str())
            })
            .collect();

        let whole = ColumnarFrame::new(&columns, &selected).to_bytes()?;
        if whole.len() as u64 <= threshold {
            let path = output_dir.join(partition_file_name(country, year, None));
            write_file(&path, &whole)?;
            written.push(PartitionFile {
                country: country.clone(),
                year,
                part: None,
                path,
                rows: selected.len(),
                bytes: whole.len() as u64,
            });
            continue;
        }

        let ranges = plan_parts(selected.len(), whole.len() as u64, threshold);
        debug!(
            country = %country,
            year,
            bytes = whole.len(),
            parts = ranges.len(),
            "splitting oversized country-year"
        );

        for (i, range) in ranges.into_iter().enumerate() {
            let chunk = &selected[range];
            let bytes = ColumnarFrame::new(&columns, chunk).to_bytes()?;
            let path = output_dir.join(partition_file_name(country, year, Some(i + 1)));
            write_file(&path, &bytes)?;
            written.push(PartitionFile {
                country: country.clone(),
                year,
                part: Some(i + 1),
                path,
                rows: chunk.len(),
                bytes: bytes.len() as u64,
            });
        }
    }

    Ok(written)
}

/// Partition every blob of `source` into per-country files.
///
/// Any unreadable blob, malformed line or failed write aborts the run.
pub fn partition_events(
    source: &dyn BlobSource,
    countries: &[String],
    threshold: u64,
    output_dir: &Path,
) -> Result<Vec<PartitionFile>> {
    let mut written = Vec::new();

    for name in source.list_blobs()? {
        let year = year_from_blob_name(&name)?;
        let text = source.download_text(&name)?;
        let rows = parse_ndjson_rows(&text)?;

        let files = partition_rows(&rows, year, countries, threshold, output_dir)?;
        info!(
            blob = %name,
            year,
            rows = rows.len(),
            files = files.len(),
            "partitioned event blob"
        );
        written.extend(files);
    }

    Ok(written)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| StabilityError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
