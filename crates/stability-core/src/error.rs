use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the stability toolkit.
#[derive(Error, Debug)]
pub enum StabilityError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// An event file lacks one of the columns the aggregator needs.
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A cell could not be interpreted as the type its column requires.
    #[error("Invalid value in column '{column}' at row {row}: {value}")]
    InvalidValue {
        column: String,
        row: String,
        value: String,
    },

    /// No usable value exists for an indicator in a country-year.
    #[error("Missing indicator data: {indicator} for {country_id} in {year}")]
    MissingIndicator {
        country_id: String,
        year: i32,
        indicator: String,
    },

    /// Quantile binning cannot produce the requested number of buckets.
    #[error("Cannot split scores into {buckets} quantile buckets: {reason}")]
    DegenerateQuantiles { buckets: usize, reason: String },

    /// A blob name does not follow the `{prefix}_{year}.{ext}` convention.
    #[error("Cannot derive a year from blob name: {0}")]
    BlobName(String),

    /// The indicator API answered with a payload of an unexpected shape.
    #[error("Unexpected API payload: {0}")]
    UnexpectedPayload(String),

    /// An error reported by the SQLite indicator store.
    #[error("Database error: {0}")]
    Database(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the stability crates.
pub type Result<T> = std::result::Result<T, StabilityError>;
