use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StabilityError};
use crate::tables::DEFAULT_COUNTRIES;

/// Serialized size above which a country-year is split into parts.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 50_000_000;

/// Root of the World Bank v2 REST API.
pub const DEFAULT_API_BASE_URL: &str = "http://api.worldbank.org/v2";

/// First year requested from the indicator API by default.
pub const DEFAULT_START_YEAR: i32 = 2000;

/// Default number of attempts per indicator request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// ── PipelineSettings ───────────────────────────────────────────────────────────

/// Paths and parameters shared by the fetch, partition, aggregate and scoring
/// steps. Persisted as JSON at `~/.gdelt-stability/settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// ISO-2 codes of the countries to process.
    pub countries: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    /// Where raw indicator snapshots are written.
    pub indicator_dir: PathBuf,
    /// Where partitioned per-country event files are written.
    pub event_dir: PathBuf,
    /// SQLite file holding the `world_bank` table.
    pub database_path: PathBuf,
    /// Partition ceiling in bytes.
    pub size_threshold: u64,
    pub api_base_url: String,
    /// Attempts per indicator request, including the first.
    pub max_retries: u32,
    /// Level name (`DEBUG`, `INFO`, `WARNING`, `ERROR`).
    pub log_level: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            start_year: DEFAULT_START_YEAR,
            end_year: chrono::Utc::now().year() - 1,
            indicator_dir: PathBuf::from("data/raw/world_bank"),
            event_dir: PathBuf::from("data/raw/gdelt"),
            database_path: PathBuf::from("data/processed/processed_database.db"),
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            log_level: "INFO".to_string(),
        }
    }
}

impl PipelineSettings {
    /// Return the default path to the persisted settings file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the settings path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".gdelt-stability").join("settings.json")
    }

    /// Load settings from the default path.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from an explicit path.
    ///
    /// Returns `Default` when the file is absent or cannot be parsed; fields
    /// missing from the file take their default values.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
                Self::default()
            }
        }
    }

    /// Atomically write settings to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write settings to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_err = |source: std::io::Error| StabilityError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(write_err)?;

        Ok(())
    }

    /// Reject settings no pipeline step could run with.
    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            return Err(StabilityError::Config("no countries configured".to_string()));
        }
        if self.start_year > self.end_year {
            return Err(StabilityError::Config(format!(
                "start year {} is after end year {}",
                self.start_year, self.end_year
            )));
        }
        if self.size_threshold == 0 {
            return Err(StabilityError::Config(
                "size threshold must be positive".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(StabilityError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
