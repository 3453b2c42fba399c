//! Quantile-based economic stability index.
//!
//! Scores are split into equal-frequency buckets whose edges are percentiles
//! of the batch itself, so the index a score receives depends on the batch it
//! is computed with.

use std::collections::BTreeSet;

use crate::error::{Result, StabilityError};
use crate::models::CountryYearScore;

/// Number of buckets in the economic index (labels `1..=5`).
pub const ECONOMIC_INDEX_BUCKETS: usize = 5;

// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using standard linear
/// interpolation (the same algorithm used by NumPy's `percentile` function).
///
/// Returns `0.0` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

// ── Quantile binning ──────────────────────────────────────────────────────────

/// Bucket edges for `buckets` equal-frequency bins over `values`.
///
/// Returns `buckets + 1` strictly increasing edges, from the minimum to the
/// maximum of `values`.
pub fn quantile_edges(values: &[f64], buckets: usize) -> Result<Vec<f64>> {
    if buckets == 0 {
        return Err(StabilityError::DegenerateQuantiles {
            buckets,
            reason: "bucket count must be positive".to_string(),
        });
    }
    if values.is_empty() {
        return Err(StabilityError::DegenerateQuantiles {
            buckets,
            reason: "no scores to bin".to_string(),
        });
    }

    let distinct: BTreeSet<u64> = values.iter().map(|v| v.to_bits()).collect();
    if distinct.len() < buckets {
        return Err(StabilityError::DegenerateQuantiles {
            buckets,
            reason: format!("only {} distinct scores", distinct.len()),
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let edges: Vec<f64> = (0..=buckets)
        .map(|i| percentile(&sorted, 100.0 * i as f64 / buckets as f64))
        .collect();

    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(StabilityError::DegenerateQuantiles {
            buckets,
            reason: format!("bin edges are not unique: {edges:?}"),
        });
    }

    Ok(edges)
}

/// Label each value with its bucket in `1..=buckets`.
///
/// Bins are closed on the right; the lowest edge belongs to bucket 1. The
/// returned labels are in the same order as `values`.
pub fn quantile_labels(values: &[f64], buckets: usize) -> Result<Vec<u8>> {
    let edges = quantile_edges(values, buckets)?;
    Ok(values
        .iter()
        .map(|&v| {
            let bucket = edges[1..]
                .iter()
                .position(|&edge| v <= edge)
                .unwrap_or(buckets - 1);
            (bucket + 1) as u8
        })
        .collect())
}

/// Assign `economic_index` to every score in the batch.
///
/// Leaves the batch untouched on error.
pub fn assign_economic_index(scores: &mut [CountryYearScore]) -> Result<()> {
    let values: Vec<f64> = scores
        .iter()
        .map(|s| f64::from(s.total_economic_score))
        .collect();
    let labels = quantile_labels(&values, ECONOMIC_INDEX_BUCKETS)?;

    for (score, label) in scores.iter_mut().zip(labels) {
        score.economic_index = Some(label);
    }

    tracing::debug!(count = scores.len(), "assigned economic index");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_score(country: &str, year: i32, total: u8) -> CountryYearScore {
        CountryYearScore {
            country_id: country.to_string(),
            year,
            total_economic_score: total,
            economic_index: None,
        }
    }

    // ── percentile ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentile_empty_returns_zero() {
        assert_eq!(percentile(&[], 90.0), 0.0);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42.0], 20.0), 42.0);
        assert_eq!(percentile(&[42.0], 100.0), 42.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = vec![1.0, 5.0, 10.0, 15.0, 20.0, 25.0, 27.0];
        // rank = 0.2 * 6 = 1.2 → 5 + 0.2 * (10 - 5) = 6
        assert!((percentile(&data, 20.0) - 6.0).abs() < 1e-9);
        assert!((percentile(&data, 100.0) - 27.0).abs() < 1e-9);
    }

    // ── quantile_labels ───────────────────────────────────────────────────────

    #[test]
    fn test_labels_span_all_buckets() {
        let values = [1.0, 5.0, 10.0, 15.0, 20.0, 25.0, 27.0];
        let labels = quantile_labels(&values, 5).unwrap();
        assert_eq!(labels, vec![1, 1, 2, 3, 4, 5, 5]);
    }

    #[test]
    fn test_labels_non_decreasing_in_score_order() {
        let values = [27.0, 1.0, 20.0, 10.0, 25.0, 5.0, 15.0];
        let labels = quantile_labels(&values, 5).unwrap();

        let mut pairs: Vec<(f64, u8)> = values.iter().copied().zip(labels).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));

        let distinct: BTreeSet<u8> = pairs.iter().map(|p| p.1).collect();
        assert_eq!(distinct, (1..=5).collect());
    }

    #[test]
    fn test_minimum_falls_in_first_bucket() {
        let values = [3.0, 8.0, 12.0, 16.0, 21.0];
        let labels = quantile_labels(&values, 5).unwrap();
        assert_eq!(labels[0], 1);
        assert_eq!(labels[4], 5);
    }

    #[test]
    fn test_too_few_distinct_scores() {
        let values = [10.0, 10.0, 12.0, 12.0, 14.0, 14.0, 16.0];
        let err = quantile_labels(&values, 5).unwrap_err();
        assert!(err.to_string().contains("only 4 distinct scores"));
    }

    #[test]
    fn test_duplicate_edges_rejected() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(matches!(
            quantile_labels(&values, 5),
            Err(StabilityError::DegenerateQuantiles { .. })
        ));
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(quantile_labels(&[], 5).is_err());
    }

    // ── assign_economic_index ─────────────────────────────────────────────────

    #[test]
    fn test_assign_economic_index() {
        let mut scores: Vec<CountryYearScore> = [1, 5, 10, 15, 20, 25, 27]
            .iter()
            .enumerate()
            .map(|(i, &total)| make_score("US", 2010 + i as i32, total))
            .collect();

        assign_economic_index(&mut scores).unwrap();

        let indices: Vec<u8> = scores.iter().map(|s| s.economic_index.unwrap()).collect();
        assert_eq!(indices, vec![1, 1, 2, 3, 4, 5, 5]);
    }

    #[test]
    fn test_assign_economic_index_is_batch_relative() {
        let mut small = vec![
            make_score("FR", 2019, 10),
            make_score("US", 2019, 12),
            make_score("BR", 2019, 14),
            make_score("IN", 2019, 16),
            make_score("ZA", 2019, 18),
        ];
        assign_economic_index(&mut small).unwrap();
        assert_eq!(small[4].economic_index, Some(5));

        let mut larger = small.clone();
        larger.extend([make_score("IR", 2019, 22), make_score("IR", 2020, 26)]);
        assign_economic_index(&mut larger).unwrap();
        assert!(larger[4].economic_index < Some(5));
    }

    #[test]
    fn test_assign_economic_index_error_leaves_batch_unset() {
        let mut scores = vec![make_score("US", 2019, 10), make_score("FR", 2019, 10)];
        assert!(assign_economic_index(&mut scores).is_err());
        assert!(scores.iter().all(|s| s.economic_index.is_none()));
    }
}
