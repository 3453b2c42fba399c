//! Two-stage event aggregation by (country, year, event code).
//!
//! Stage 1 summarizes each event file on its own. Stage 2 merges the
//! per-file summaries so that a country-year split across several partition
//! files aggregates to the same statistics as the unsplit data.

use std::collections::BTreeMap;
use std::path::Path;

use stability_core::error::{Result, StabilityError};
use stability_core::models::{EventAggregate, EventKey, EventRecord};
use tracing::{debug, info};

use crate::reader::{find_json_files, load_event_records, COL_DATE};

// ── Weighting ─────────────────────────────────────────────────────────────────

/// Mean of partial means weighted by the number of observations behind each.
///
/// Parts with a zero count contribute nothing. Returns `0.0` when the total
/// count is zero.
pub fn weighted_mean(parts: &[(u64, f64)]) -> f64 {
    let total: u64 = parts.iter().map(|(count, _)| count).sum();
    if total == 0 {
        return 0.0;
    }
    let weighted: f64 = parts
        .iter()
        .map(|(count, mean)| *count as f64 * mean)
        .sum();
    weighted / total as f64
}

// ── Range ─────────────────────────────────────────────────────────────────────

/// Running sum, minimum and maximum of one numeric column.
#[derive(Debug, Clone, Copy)]
struct Range {
    sum: f64,
    min: f64,
    max: f64,
}

impl Range {
    fn new(value: f64) -> Self {
        Self {
            sum: value,
            min: value,
            max: value,
        }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

// ── EventStats ────────────────────────────────────────────────────────────────

/// Stage-1 accumulator for a single group.
#[derive(Debug, Clone)]
struct EventStats {
    count: u64,
    mentions: u64,
    goldstein: Range,
    tone: Range,
}

impl EventStats {
    fn new(event: &EventRecord) -> Self {
        Self {
            count: 1,
            mentions: event.num_mentions,
            goldstein: Range::new(event.goldstein_scale),
            tone: Range::new(event.avg_tone),
        }
    }

    fn add_event(&mut self, event: &EventRecord) {
        self.count += 1;
        self.mentions += event.num_mentions;
        self.goldstein.add(event.goldstein_scale);
        self.tone.add(event.avg_tone);
    }

    fn into_aggregate(self, key: EventKey) -> EventAggregate {
        let n = self.count as f64;
        EventAggregate {
            country_code: key.country_code,
            year: key.year,
            event_code: key.event_code,
            num_occurrences: self.count,
            num_mentions: self.mentions,
            avg_goldstein: self.goldstein.sum / n,
            min_goldstein: self.goldstein.min,
            max_goldstein: self.goldstein.max,
            avg_tone: self.tone.sum / n,
            min_tone: self.tone.min,
            max_tone: self.tone.max,
        }
    }
}

// ── Stage 1 ───────────────────────────────────────────────────────────────────

/// Group `events` by key and summarize each group.
///
/// Returns aggregates ordered by key. An event whose date does not start with
/// a four-digit year fails with [`StabilityError::InvalidValue`].
pub fn aggregate_records(events: &[EventRecord]) -> Result<Vec<EventAggregate>> {
    let mut groups: BTreeMap<EventKey, EventStats> = BTreeMap::new();

    for event in events {
        let year = event.year().ok_or_else(|| StabilityError::InvalidValue {
            column: COL_DATE.to_string(),
            row: format!("{}/{}", event.country_code, event.event_code),
            value: event.date.clone(),
        })?;
        let key = EventKey {
            country_code: event.country_code.clone(),
            year,
            event_code: event.event_code.clone(),
        };
        match groups.get_mut(&key) {
            Some(stats) => stats.add_event(event),
            None => {
                groups.insert(key, EventStats::new(event));
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, stats)| stats.into_aggregate(key))
        .collect())
}

/// Stage-1 aggregates of a single event file.
pub fn aggregate_file(path: &Path) -> Result<Vec<EventAggregate>> {
    let events = load_event_records(path)?;
    let aggregates = aggregate_records(&events)?;
    debug!(
        "File {}: {} events in {} groups",
        path.display(),
        events.len(),
        aggregates.len()
    );
    Ok(aggregates)
}

// ── Stage 2 ───────────────────────────────────────────────────────────────────

/// Merge partial aggregates that share a key.
///
/// Counts and mentions are summed, averages are count-weighted with
/// [`weighted_mean`], and extrema are taken over all parts. Output is
/// ordered by key.
pub fn merge_aggregates(partials: impl IntoIterator<Item = EventAggregate>) -> Vec<EventAggregate> {
    let mut groups: BTreeMap<EventKey, Vec<EventAggregate>> = BTreeMap::new();
    for partial in partials {
        groups.entry(partial.key()).or_default().push(partial);
    }

    groups
        .into_iter()
        .map(|(key, parts)| merge_group(key, &parts))
        .collect()
}

fn merge_group(key: EventKey, parts: &[EventAggregate]) -> EventAggregate {
    let goldstein: Vec<(u64, f64)> = parts
        .iter()
        .map(|p| (p.num_occurrences, p.avg_goldstein))
        .collect();
    let tone: Vec<(u64, f64)> = parts
        .iter()
        .map(|p| (p.num_occurrences, p.avg_tone))
        .collect();

    EventAggregate {
        country_code: key.country_code,
        year: key.year,
        event_code: key.event_code,
        num_occurrences: parts.iter().map(|p| p.num_occurrences).sum(),
        num_mentions: parts.iter().map(|p| p.num_mentions).sum(),
        avg_goldstein: weighted_mean(&goldstein),
        min_goldstein: fold_min(parts.iter().map(|p| p.min_goldstein)),
        max_goldstein: fold_max(parts.iter().map(|p| p.max_goldstein)),
        avg_tone: weighted_mean(&tone),
        min_tone: fold_min(parts.iter().map(|p| p.min_tone)),
        max_tone: fold_max(parts.iter().map(|p| p.max_tone)),
    }
}

fn fold_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

fn fold_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

// ── Directory driver ──────────────────────────────────────────────────────────

/// Aggregate every `.json` event file in `dir`.
///
/// Files are read in path order. A missing directory, or any file that is
/// missing a required column or holds an unreadable cell, aborts the whole
/// run.
pub fn aggregate_directory(dir: &Path) -> Result<Vec<EventAggregate>> {
    let files = find_json_files(dir)?;
    let mut partials = Vec::new();
    for path in &files {
        partials.extend(aggregate_file(path)?);
    }

    let merged = merge_aggregates(partials);
    info!(
        "Aggregated {} files from {} into {} groups",
        files.len(),
        dir.display(),
        merged.len()
    );
    Ok(merged)
}

/// Write aggregates to `path` as a pretty-printed JSON array.
pub fn write_aggregates(path: &Path, aggregates: &[EventAggregate]) -> Result<()> {
    let write_err = |source: std::io::Error| StabilityError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(aggregates)?;
    std::fs::write(path, json).map_err(write_err)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
