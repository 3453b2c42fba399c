//! Batch entry points wiring settings to the data and scoring layers.
//!
//! Each stage reads its inputs from the directories named in
//! [`PipelineSettings`] and can be run on its own.

use stability_core::index::assign_economic_index;
use stability_core::models::{CountryYearScore, EventAggregate};
use stability_core::scoring::score_country_year;
use stability_core::settings::PipelineSettings;
use stability_core::Result;
use stability_data::aggregator::aggregate_directory;
use stability_data::normalizer::normalize_directory;
use stability_data::partitioner::{partition_events, BlobSource, PartitionFile};
use stability_data::store::WorldBankStore;
use tracing::info;

use crate::collector::{collect_data, stability_indicators, CollectedSeries};
use crate::worldbank::IndicatorSource;

/// Fetch the nine stability indicators for every configured country.
pub fn collect_indicators(
    source: &dyn IndicatorSource,
    settings: &PipelineSettings,
) -> crate::error::Result<Vec<CollectedSeries>> {
    collect_data(
        source,
        &settings.countries,
        &stability_indicators(),
        settings.start_year,
        settings.end_year,
        &settings.indicator_dir,
    )
}

/// Replace the contents of `store` with every snapshot in `settings.indicator_dir`.
///
/// A missing directory or unreadable snapshot fails before the store is
/// touched.
pub fn load_indicator_store(
    store: &mut WorldBankStore,
    settings: &PipelineSettings,
) -> Result<usize> {
    let records = normalize_directory(&settings.indicator_dir)?;
    store.replace_records(&records)
}

/// Open the configured database and load it from the indicator snapshots.
pub fn build_indicator_store(settings: &PipelineSettings) -> Result<WorldBankStore> {
    let mut store = WorldBankStore::open(&settings.database_path)?;
    load_indicator_store(&mut store, settings)?;
    Ok(store)
}

/// Score every country-year in `store`, then index the batch.
///
/// A country-year missing any indicator aborts the whole batch.
pub fn score_all(store: &WorldBankStore) -> Result<Vec<CountryYearScore>> {
    let mut scores = Vec::new();
    for (country_id, year) in store.country_years()? {
        let records = store.records_for(&country_id, year)?;
        scores.push(score_country_year(&records, &country_id, year)?);
    }
    assign_economic_index(&mut scores)?;
    info!("Scored {} country-years", scores.len());
    Ok(scores)
}

/// Split the blobs of `source` into per-country files under `settings.event_dir`.
pub fn partition_from_settings(
    source: &dyn BlobSource,
    settings: &PipelineSettings,
) -> Result<Vec<PartitionFile>> {
    std::fs::create_dir_all(&settings.event_dir)?;
    partition_events(
        source,
        &settings.countries,
        settings.size_threshold,
        &settings.event_dir,
    )
}

/// Aggregate the partitioned event files under `settings.event_dir`.
pub fn aggregate_from_settings(settings: &PipelineSettings) -> Result<Vec<EventAggregate>> {
    aggregate_directory(&settings.event_dir)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use stability_core::scoring::STABILITY_RULES;
    use stability_core::StabilityError;
    use stability_data::partitioner::DirectoryBlobSource;
    use tempfile::TempDir;

    /// Indicator values that score zero on every rule.
    const LOWEST: [f64; 9] = [0.0, 250.0, 30.0, 3.0, 63.0, 20.0, 2.0, -1.0, -2.0];

    fn settings_in(tmp: &TempDir) -> PipelineSettings {
        PipelineSettings {
            indicator_dir: tmp.path().join("world_bank"),
            event_dir: tmp.path().join("gdelt"),
            database_path: tmp.path().join("processed").join("db.sqlite"),
            ..Default::default()
        }
    }

    /// Write one snapshot per indicator holding `(country, year, values)` rows.
    fn write_snapshots(settings: &PipelineSettings, rows: &[(&str, i32, [f64; 9])]) {
        std::fs::create_dir_all(&settings.indicator_dir).unwrap();
        for (i, rule) in STABILITY_RULES.iter().enumerate() {
            let records: Vec<Value> = rows
                .iter()
                .map(|(country, year, values)| {
                    json!({
                        "indicator": {"id": rule.code, "value": rule.name},
                        "country": {"id": country, "value": country},
                        "date": year.to_string(),
                        "value": values[i],
                    })
                })
                .collect();
            let doc = json!([{"page": 1}, records]);
            std::fs::write(
                settings.indicator_dir.join(format!("ALL_{}.json", rule.name)),
                doc.to_string(),
            )
            .unwrap();
        }
    }

    fn with_gdp_and_effectiveness(gdp: f64, effectiveness: f64) -> [f64; 9] {
        let mut values = LOWEST;
        values[0] = gdp;
        values[7] = effectiveness;
        values
    }

    // ── scoring batch ─────────────────────────────────────────────────────────

    #[test]
    fn test_store_scoring_and_index() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_in(&tmp);
        write_snapshots(
            &settings,
            &[
                ("BR", 2019, with_gdp_and_effectiveness(0.0, -1.0)),
                ("FR", 2019, with_gdp_and_effectiveness(2.0, -1.0)),
                ("IN", 2019, with_gdp_and_effectiveness(3.0, -1.0)),
                ("US", 2019, with_gdp_and_effectiveness(5.0, -1.0)),
                ("ZA", 2019, with_gdp_and_effectiveness(5.0, 1.5)),
            ],
        );

        let store = build_indicator_store(&settings).unwrap();
        assert_eq!(store.len().unwrap(), 45);

        let scores = score_all(&store).unwrap();
        let totals: Vec<u8> = scores.iter().map(|s| s.total_economic_score).collect();
        assert_eq!(totals, vec![0, 1, 2, 3, 6]);
        let index: Vec<Option<u8>> = scores.iter().map(|s| s.economic_index).collect();
        assert_eq!(index, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_reload_replaces_rows() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_in(&tmp);
        write_snapshots(&settings, &[("BR", 2019, LOWEST)]);

        let mut store = build_indicator_store(&settings).unwrap();
        load_indicator_store(&mut store, &settings).unwrap();
        assert_eq!(store.len().unwrap(), 9);
    }

    #[test]
    fn test_missing_indicator_dir_keeps_store() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_in(&tmp);
        write_snapshots(&settings, &[("BR", 2019, LOWEST)]);
        let mut store = build_indicator_store(&settings).unwrap();

        let typo = PipelineSettings {
            indicator_dir: tmp.path().join("wrold_bank"),
            ..settings_in(&tmp)
        };
        match load_indicator_store(&mut store, &typo).unwrap_err() {
            StabilityError::FileRead { path, .. } => assert_eq!(path, typo.indicator_dir),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.len().unwrap(), 9);
    }

    #[test]
    fn test_missing_indicator_aborts_batch() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_in(&tmp);
        write_snapshots(&settings, &[("US", 2020, LOWEST)]);
        std::fs::remove_file(settings.indicator_dir.join("ALL_control_corruption.json")).unwrap();

        let store = build_indicator_store(&settings).unwrap();
        match score_all(&store).unwrap_err() {
            StabilityError::MissingIndicator { indicator, .. } => assert_eq!(indicator, "CC.EST"),
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── events ────────────────────────────────────────────────────────────────

    #[test]
    fn test_partition_then_aggregate() {
        let tmp = TempDir::new().unwrap();
        let settings = PipelineSettings {
            countries: vec!["FR".to_string(), "IR".to_string()],
            ..settings_in(&tmp)
        };

        let blobs = tmp.path().join("blobs");
        std::fs::create_dir_all(&blobs).unwrap();
        let lines: Vec<String> = [
            ("FR", "141", 2, -6.5, -1.0),
            ("IR", "1823", 5, -9.5, -8.0),
            ("FR", "141", 4, -4.5, 1.0),
            ("US", "0231", 1, 3.0, 2.0),
        ]
        .iter()
        .map(|(country, code, mentions, gs, tone)| {
            json!({
                "SQLDATE": "20210315",
                "EventCode": code,
                "NumMentions": mentions,
                "GoldsteinScale": gs,
                "AvgTone": tone,
                "ActionGeo_CountryCode": country,
                "ActionGeo_FullName": "somewhere",
            })
            .to_string()
        })
        .collect();
        std::fs::write(blobs.join("events_2021.json"), lines.join("\n")).unwrap();

        let files = partition_from_settings(&DirectoryBlobSource::new(&blobs), &settings).unwrap();
        assert_eq!(files.len(), 2);

        let aggregates = aggregate_from_settings(&settings).unwrap();
        assert_eq!(aggregates.len(), 2);
        let fr = &aggregates[0];
        assert_eq!((fr.country_code.as_str(), fr.year), ("FR", 2021));
        assert_eq!(fr.num_occurrences, 2);
        assert_eq!(fr.num_mentions, 6);
        assert_eq!(fr.avg_goldstein, -5.5);
        assert_eq!(aggregates[1].event_code, "1823");
    }
}
