//! Aggregate views over the results table
//!
//! Computes the four fixed views shown after an enhanced search: mean rating
//! per category, price tier counts, a rating histogram, and category counts.

use std::collections::BTreeMap;

use crate::data::{ResultRow, UNKNOWN};
use crate::table::{self, ResultTable};

/// Lowest rating bin of the histogram
const HISTOGRAM_MIN: f64 = 1.0;
/// Width of one histogram bin (half a star)
const HISTOGRAM_STEP: f64 = 0.5;
/// Number of bins from 1.0 to 5.0 inclusive
const HISTOGRAM_BINS: usize = 9;

/// The four aggregate views of one load
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    /// Location label the rows were loaded for
    pub location: String,
    /// Mean rating per category, sorted by category
    pub average_rating_by_category: Vec<(String, f64)>,
    /// Rows per price tier excluding `unknown`, sorted by tier
    pub price_counts: Vec<(String, u64)>,
    /// Rows per half-star rating bin, from 1.0 to 5.0
    pub rating_histogram: Vec<(f64, u64)>,
    /// Rows per category, sorted by category
    pub category_counts: Vec<(String, u64)>,
}

impl Report {
    /// Reads the whole table and aggregates it
    pub fn from_table(table: &ResultTable) -> table::Result<Self> {
        Ok(Self::from_rows(&table.rows()?))
    }

    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut rating_sums: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
        let mut prices: BTreeMap<&str, u64> = BTreeMap::new();
        let mut histogram = [0u64; HISTOGRAM_BINS];

        for row in rows {
            let entry = rating_sums.entry(row.category.as_str()).or_default();
            entry.0 += row.rating;
            entry.1 += 1;

            if row.price != UNKNOWN {
                *prices.entry(row.price.as_str()).or_default() += 1;
            }

            histogram[histogram_bin(row.rating)] += 1;
        }

        Self {
            location: rows.first().map(|r| r.location.clone()).unwrap_or_default(),
            average_rating_by_category: rating_sums
                .iter()
                .map(|(category, (sum, count))| (category.to_string(), sum / *count as f64))
                .collect(),
            price_counts: prices
                .into_iter()
                .map(|(price, count)| (price.to_string(), count))
                .collect(),
            rating_histogram: histogram
                .iter()
                .enumerate()
                .map(|(i, count)| (HISTOGRAM_MIN + i as f64 * HISTOGRAM_STEP, *count))
                .collect(),
            category_counts: rating_sums
                .into_iter()
                .map(|(category, (_, count))| (category.to_string(), count))
                .collect(),
        }
    }

    /// Total number of rows aggregated
    pub fn total(&self) -> u64 {
        self.category_counts.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Bin index for a rating, clamped to the histogram range
fn histogram_bin(rating: f64) -> usize {
    let bin = ((rating - HISTOGRAM_MIN) / HISTOGRAM_STEP).round();
    bin.clamp(0.0, (HISTOGRAM_BINS - 1) as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rating: f64, category: &str, price: &str) -> ResultRow {
        ResultRow {
            location: "48104".to_string(),
            rating,
            category: category.to_string(),
            price: price.to_string(),
            name: format!("{} {}", category, rating),
        }
    }

    fn sample_rows() -> Vec<ResultRow> {
        vec![
            row(4.5, "pizza", "$$"),
            row(3.5, "pizza", "$"),
            row(5.0, "thai", "unknown"),
            row(4.0, "bars", "$$"),
        ]
    }

    #[test]
    fn test_average_rating_by_category() {
        let report = Report::from_rows(&sample_rows());
        assert_eq!(
            report.average_rating_by_category,
            vec![
                ("bars".to_string(), 4.0),
                ("pizza".to_string(), 4.0),
                ("thai".to_string(), 5.0),
            ]
        );
    }

    #[test]
    fn test_price_counts_exclude_unknown() {
        let report = Report::from_rows(&sample_rows());
        assert_eq!(
            report.price_counts,
            vec![("$".to_string(), 1), ("$$".to_string(), 2)]
        );
    }

    #[test]
    fn test_rating_histogram_bins() {
        let report = Report::from_rows(&sample_rows());

        assert_eq!(report.rating_histogram.len(), HISTOGRAM_BINS);
        assert_eq!(report.rating_histogram[0], (1.0, 0));
        assert_eq!(report.rating_histogram[5], (3.5, 1));
        assert_eq!(report.rating_histogram[6], (4.0, 1));
        assert_eq!(report.rating_histogram[7], (4.5, 1));
        assert_eq!(report.rating_histogram[8], (5.0, 1));
    }

    #[test]
    fn test_histogram_bin_clamps() {
        assert_eq!(histogram_bin(0.0), 0);
        assert_eq!(histogram_bin(1.0), 0);
        assert_eq!(histogram_bin(4.5), 7);
        assert_eq!(histogram_bin(7.0), HISTOGRAM_BINS - 1);
    }

    #[test]
    fn test_category_counts_and_total() {
        let report = Report::from_rows(&sample_rows());
        assert_eq!(
            report.category_counts,
            vec![
                ("bars".to_string(), 1),
                ("pizza".to_string(), 2),
                ("thai".to_string(), 1),
            ]
        );
        assert_eq!(report.total(), 4);
        assert_eq!(report.location, "48104");
    }

    #[test]
    fn test_empty_rows() {
        let report = Report::from_rows(&[]);
        assert!(report.is_empty());
        assert!(report.average_rating_by_category.is_empty());
        assert!(report.rating_histogram.iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_from_table() {
        let table = ResultTable::open_in_memory().unwrap();
        let report = Report::from_table(&table).unwrap();
        assert!(report.is_empty());
    }
}
