//! Fetches every country × indicator series and saves the raw responses.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use stability_core::scoring::STABILITY_RULES;
use stability_core::StabilityError;
use tracing::info;

use crate::error::Result;
use crate::worldbank::IndicatorSource;

/// One fetched series, tagged with what was asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedSeries {
    pub country: String,
    pub indicator: String,
    pub data: Value,
}

/// `(name, code)` pairs for the nine scored indicators.
pub fn stability_indicators() -> Vec<(&'static str, &'static str)> {
    STABILITY_RULES.iter().map(|r| (r.name, r.code)).collect()
}

/// Fetch each `(indicator name, indicator code)` for each country.
///
/// Every response is written to `{save_path}/{country}_{name}.json` as it
/// arrives. The first failed request aborts the run; files already written
/// are left in place.
pub fn collect_data(
    source: &dyn IndicatorSource,
    countries: &[String],
    indicators: &[(&str, &str)],
    start_year: i32,
    end_year: i32,
    save_path: &Path,
) -> Result<Vec<CollectedSeries>> {
    std::fs::create_dir_all(save_path).map_err(|source| StabilityError::FileWrite {
        path: save_path.to_path_buf(),
        source,
    })?;

    let mut all_data = Vec::with_capacity(countries.len() * indicators.len());
    for country in countries {
        for (name, code) in indicators {
            info!("Fetching data for {} - {}...", country, name);
            let data = source.fetch_indicator(country, code, start_year, end_year)?;

            let path = save_path.join(format!("{country}_{name}.json"));
            write_snapshot(&path, &data)?;

            all_data.push(CollectedSeries {
                country: country.clone(),
                indicator: name.to_string(),
                data,
            });
        }
    }
    Ok(all_data)
}

/// Write `value` as JSON indented with four spaces.
pub fn write_snapshot(path: &Path, value: &Value) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    std::fs::write(path, buf).map_err(|source| StabilityError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
