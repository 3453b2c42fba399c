use serde::{Deserialize, Serialize};

/// One World Bank observation, flattened out of the API's nested JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// ISO-2 country identifier as reported by the API (e.g. `"US"`).
    pub country_id: String,
    /// World Bank indicator code (e.g. `"NY.GDP.MKTP.KD.ZG"`).
    pub indicator_id: String,
    /// Calendar year of the observation.
    pub year: i32,
    /// Observed value; `None` when the API reports no data for the year.
    pub value: Option<f64>,
}

/// A single GDELT event row, reduced to the columns the aggregator uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// `SQLDATE` in `YYYYMMDD` form.
    pub date: String,
    /// CAMEO event code in its string form (e.g. `"0231"`, `"1041"`).
    pub event_code: String,
    pub num_mentions: u64,
    pub goldstein_scale: f64,
    pub avg_tone: f64,
    /// FIPS country code of the action location.
    pub country_code: String,
}

impl EventRecord {
    /// Year taken from the leading four characters of [`EventRecord::date`].
    ///
    /// Returns `None` when the date is shorter than four characters or the
    /// prefix is not an integer.
    pub fn year(&self) -> Option<i32> {
        self.date.get(..4)?.parse().ok()
    }
}

/// Grouping key shared by both aggregation stages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub country_code: String,
    pub year: i32,
    pub event_code: String,
}

/// Summary statistics for one (country, year, event code) group.
///
/// `avg_*` fields are occurrence-weighted means; `min_*`/`max_*` are true
/// extrema over every event that contributed to the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAggregate {
    pub country_code: String,
    pub year: i32,
    pub event_code: String,
    pub num_occurrences: u64,
    pub num_mentions: u64,
    pub avg_goldstein: f64,
    pub min_goldstein: f64,
    pub max_goldstein: f64,
    pub avg_tone: f64,
    pub min_tone: f64,
    pub max_tone: f64,
}

impl EventAggregate {
    pub fn key(&self) -> EventKey {
        EventKey {
            country_code: self.country_code.clone(),
            year: self.year,
            event_code: self.event_code.clone(),
        }
    }
}

/// Economic stability outcome for one country-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryYearScore {
    pub country_id: String,
    pub year: i32,
    /// Sum of the nine indicator bucket scores, in `0..=27`.
    pub total_economic_score: u8,
    /// Quantile label in `1..=5`; `None` until an index has been assigned
    /// over a batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economic_index: Option<u8>,
}
