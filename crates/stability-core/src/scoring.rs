//! Rule-based economic stability scoring.
//!
//! Each of nine World Bank indicators is bucketed into `0..=3` by three
//! literal quartile thresholds; a country-year's total is the sum of the nine
//! buckets, in `0..=27`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StabilityError};
use crate::models::{CountryYearScore, IndicatorRecord};

/// Highest possible total score.
pub const MAX_TOTAL_SCORE: u8 = 27;

/// Whether a larger indicator value is better or worse for stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Higher value, higher score.
    Ascending,
    /// Lower value, higher score.
    Descending,
}

/// Scoring rule for a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRule {
    /// Short snake_case name, also used in snapshot file names.
    pub name: &'static str,
    /// World Bank indicator code.
    pub code: &'static str,
    /// Bucket boundaries; a value equal to a boundary falls in the upper bucket.
    pub thresholds: [f64; 3],
    pub direction: Direction,
}

impl IndicatorRule {
    /// Bucket score in `0..=3` for `value`.
    pub fn score(&self, value: f64) -> u8 {
        let bucket = self.thresholds.iter().filter(|&&t| value >= t).count() as u8;
        match self.direction {
            Direction::Ascending => bucket,
            Direction::Descending => 3 - bucket,
        }
    }
}

/// The nine stability indicators in scoring order.
pub const STABILITY_RULES: [IndicatorRule; 9] = [
    IndicatorRule {
        name: "gdp_growth",
        code: "NY.GDP.MKTP.KD.ZG",
        thresholds: [1.2, 2.9, 4.8],
        direction: Direction::Ascending,
    },
    IndicatorRule {
        name: "inflation",
        code: "FP.CPI.TOTL",
        thresholds: [128.05, 144.0, 199.6],
        direction: Direction::Descending,
    },
    IndicatorRule {
        name: "unemployment",
        code: "SL.UEM.TOTL.ZS",
        thresholds: [3.6, 5.5, 8.4],
        direction: Direction::Descending,
    },
    IndicatorRule {
        name: "income_lowest_20",
        code: "SI.DST.FRST.20",
        thresholds: [6.0, 7.0, 7.7],
        direction: Direction::Ascending,
    },
    IndicatorRule {
        name: "gini_index",
        code: "SI.POV.GINI",
        thresholds: [31.45, 35.1, 40.85],
        direction: Direction::Descending,
    },
    IndicatorRule {
        name: "poverty_headcount",
        code: "SI.POV.DDAY",
        thresholds: [0.3, 1.7, 14.6],
        direction: Direction::Descending,
    },
    IndicatorRule {
        name: "education_expenditure",
        code: "SE.XPD.TOTL.GD.ZS",
        thresholds: [2.9, 4.15, 5.4],
        direction: Direction::Ascending,
    },
    IndicatorRule {
        name: "government_effectiveness",
        code: "GE.EST",
        thresholds: [-0.25, 0.094, 1.24],
        direction: Direction::Ascending,
    },
    IndicatorRule {
        name: "control_corruption",
        code: "CC.EST",
        thresholds: [-1.0, 0.0, 1.0],
        direction: Direction::Ascending,
    },
];

/// Look up a rule by its World Bank code.
pub fn rule_for_code(code: &str) -> Option<&'static IndicatorRule> {
    STABILITY_RULES.iter().find(|r| r.code == code)
}

/// First value recorded for `indicator` in the given country-year.
///
/// Rows with a `null` value count as missing.
fn indicator_value(
    records: &[IndicatorRecord],
    country_id: &str,
    year: i32,
    indicator: &str,
) -> Result<f64> {
    records
        .iter()
        .find(|r| r.country_id == country_id && r.year == year && r.indicator_id == indicator)
        .and_then(|r| r.value)
        .ok_or_else(|| StabilityError::MissingIndicator {
            country_id: country_id.to_string(),
            year,
            indicator: indicator.to_string(),
        })
}

/// Total stability score for `country_id` in `year`, in `0..=27`.
///
/// `records` may hold rows for other country-years; only matching rows are
/// consulted. Fails with [`StabilityError::MissingIndicator`] on the first
/// indicator that has no usable value.
pub fn economic_stability_score(
    records: &[IndicatorRecord],
    country_id: &str,
    year: i32,
) -> Result<u8> {
    let mut score = 0u8;
    for rule in &STABILITY_RULES {
        let value = indicator_value(records, country_id, year, rule.code)?;
        score += rule.score(value);
    }
    Ok(score)
}

/// Score a country-year into an unindexed [`CountryYearScore`].
pub fn score_country_year(
    records: &[IndicatorRecord],
    country_id: &str,
    year: i32,
) -> Result<CountryYearScore> {
    Ok(CountryYearScore {
        country_id: country_id.to_string(),
        year,
        total_economic_score: economic_stability_score(records, country_id, year)?,
        economic_index: None,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_records(country: &str, year: i32, values: [f64; 9]) -> Vec<IndicatorRecord> {
        STABILITY_RULES
            .iter()
            .zip(values)
            .map(|(rule, value)| IndicatorRecord {
                country_id: country.to_string(),
                indicator_id: rule.code.to_string(),
                year,
                value: Some(value),
            })
            .collect()
    }

    // ── IndicatorRule::score ──────────────────────────────────────────────────

    #[test]
    fn test_ascending_buckets() {
        let gdp = rule_for_code("NY.GDP.MKTP.KD.ZG").unwrap();
        assert_eq!(gdp.score(0.5), 0);
        assert_eq!(gdp.score(1.2), 1);
        assert_eq!(gdp.score(2.89), 1);
        assert_eq!(gdp.score(2.9), 2);
        assert_eq!(gdp.score(4.8), 3);
        assert_eq!(gdp.score(12.0), 3);
    }

    #[test]
    fn test_descending_buckets() {
        let inflation = rule_for_code("FP.CPI.TOTL").unwrap();
        assert_eq!(inflation.score(100.0), 3);
        assert_eq!(inflation.score(128.05), 2);
        assert_eq!(inflation.score(150.0), 1);
        assert_eq!(inflation.score(199.6), 0);
    }

    #[test]
    fn test_negative_thresholds() {
        let effectiveness = rule_for_code("GE.EST").unwrap();
        assert_eq!(effectiveness.score(-0.3), 0);
        assert_eq!(effectiveness.score(-0.25), 1);
        assert_eq!(effectiveness.score(0.094), 2);
        assert_eq!(effectiveness.score(1.3), 3);

        let corruption = rule_for_code("CC.EST").unwrap();
        assert_eq!(corruption.score(-1.5), 0);
        assert_eq!(corruption.score(-0.5), 1);
        assert_eq!(corruption.score(0.0), 2);
        assert_eq!(corruption.score(1.0), 3);
    }

    #[test]
    fn test_rules_have_unique_codes() {
        for (i, a) in STABILITY_RULES.iter().enumerate() {
            for b in &STABILITY_RULES[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
    }

    // ── economic_stability_score ──────────────────────────────────────────────

    #[test]
    fn test_maximum_score() {
        let records = make_records("US", 2019, [5.0, 100.0, 2.0, 8.0, 25.0, 0.1, 6.0, 1.5, 1.5]);
        assert_eq!(economic_stability_score(&records, "US", 2019).unwrap(), MAX_TOTAL_SCORE);
    }

    #[test]
    fn test_minimum_score() {
        let records = make_records(
            "ZA",
            2019,
            [0.0, 250.0, 30.0, 3.0, 63.0, 20.0, 2.0, -1.0, -2.0],
        );
        assert_eq!(economic_stability_score(&records, "ZA", 2019).unwrap(), 0);
    }

    #[test]
    fn test_mixed_score() {
        // gdp 1, inflation 2, unemployment 1, income 2, gini 1, poverty 2,
        // education 2, effectiveness 2, corruption 1.
        let records = make_records(
            "BR",
            2015,
            [2.0, 130.0, 6.0, 7.2, 36.0, 1.0, 5.0, 0.5, -0.2],
        );
        assert_eq!(economic_stability_score(&records, "BR", 2015).unwrap(), 14);
    }

    #[test]
    fn test_only_matching_country_year_is_used() {
        let mut records = make_records("US", 2019, [5.0, 100.0, 2.0, 8.0, 25.0, 0.1, 6.0, 1.5, 1.5]);
        records.extend(make_records("US", 2020, [0.0; 9]));
        assert_eq!(economic_stability_score(&records, "US", 2019).unwrap(), 27);
    }

    #[test]
    fn test_first_row_wins_for_duplicates() {
        let mut records = make_records("FR", 2018, [5.0, 100.0, 2.0, 8.0, 25.0, 0.1, 6.0, 1.5, 1.5]);
        records.push(IndicatorRecord {
            country_id: "FR".to_string(),
            indicator_id: "NY.GDP.MKTP.KD.ZG".to_string(),
            year: 2018,
            value: Some(-4.0),
        });
        assert_eq!(economic_stability_score(&records, "FR", 2018).unwrap(), 27);
    }

    #[test]
    fn test_missing_indicator_is_error() {
        let mut records = make_records("IN", 2017, [5.0; 9]);
        records.retain(|r| r.indicator_id != "SI.POV.GINI");
        let err = economic_stability_score(&records, "IN", 2017).unwrap_err();
        match err {
            StabilityError::MissingIndicator {
                country_id,
                year,
                indicator,
            } => {
                assert_eq!(country_id, "IN");
                assert_eq!(year, 2017);
                assert_eq!(indicator, "SI.POV.GINI");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_value_is_missing() {
        let mut records = make_records("IR", 2016, [5.0; 9]);
        records[0].value = None;
        assert!(matches!(
            economic_stability_score(&records, "IR", 2016),
            Err(StabilityError::MissingIndicator { .. })
        ));
    }

    #[test]
    fn test_empty_records_is_error() {
        assert!(economic_stability_score(&[], "US", 2020).is_err());
    }

    #[test]
    fn test_score_country_year_leaves_index_unset() {
        let records = make_records("US", 2019, [5.0, 100.0, 2.0, 8.0, 25.0, 0.1, 6.0, 1.5, 1.5]);
        let score = score_country_year(&records, "US", 2019).unwrap();
        assert_eq!(score.total_economic_score, 27);
        assert_eq!(score.economic_index, None);
    }
}
