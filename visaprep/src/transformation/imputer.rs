//! Missing-value imputation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Median of the non-null values, or `None` if there are none.
#[must_use]
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);
    let mid = present.len() / 2;
    Some(if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    })
}

/// Most frequent non-null label; ties go to the lexicographically smallest.
#[must_use]
pub fn most_frequent(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    // BTreeMap iterates in key order, so max_by_key keeps the last maximum;
    // reversing makes the smallest key win ties.
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, n)| *n)
        .map(|(label, _)| label.to_string())
}

/// Median imputer fitted on numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedMedianImputer {
    /// Fill value per column.
    pub statistics: Vec<f64>,
}

impl FittedMedianImputer {
    /// Learns the median of each column. Columns without values fill with 0.
    #[must_use]
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        Self {
            statistics: columns.iter().map(|c| median(c).unwrap_or(0.0)).collect(),
        }
    }

    /// Replaces nulls with the learned medians.
    #[must_use]
    pub fn transform(&self, columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
        columns
            .iter()
            .zip(&self.statistics)
            .map(|(c, fill)| c.iter().map(|v| v.unwrap_or(*fill)).collect())
            .collect()
    }
}

/// Most-frequent imputer fitted on categorical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedModeImputer {
    /// Fill label per column.
    pub statistics: Vec<String>,
}

impl FittedModeImputer {
    /// Learns the most frequent label of each column.
    #[must_use]
    pub fn fit(columns: &[Vec<Option<String>>]) -> Self {
        Self {
            statistics: columns
                .iter()
                .map(|c| most_frequent(c).unwrap_or_default())
                .collect(),
        }
    }

    /// Replaces nulls with the learned labels.
    #[must_use]
    pub fn transform(&self, columns: &[Vec<Option<String>>]) -> Vec<Vec<String>> {
        columns
            .iter()
            .zip(&self.statistics)
            .map(|(c, fill)| {
                c.iter()
                    .map(|v| v.clone().unwrap_or_else(|| fill.clone()))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[Some(3.0), None, Some(1.0), Some(2.0)]), Some(2.0));
        assert_eq!(median(&[Some(4.0), Some(1.0)]), Some(2.5));
        assert_eq!(median(&[None]), None);
    }

    #[test]
    fn test_most_frequent_tie_breaks_low() {
        assert_eq!(
            most_frequent(&labels(&[Some("b"), Some("a"), Some("b"), Some("a"), None])),
            Some("a".to_string())
        );
        assert_eq!(
            most_frequent(&labels(&[Some("z"), Some("y"), Some("z")])),
            Some("z".to_string())
        );
    }

    #[test]
    fn test_median_imputer() {
        let fitted = FittedMedianImputer::fit(&[vec![Some(1.0), None, Some(5.0)]]);
        assert_eq!(fitted.statistics, vec![3.0]);

        let out = fitted.transform(&[vec![None, Some(7.0)]]);
        assert_eq!(out, vec![vec![3.0, 7.0]]);
    }

    #[test]
    fn test_mode_imputer() {
        let fitted = FittedModeImputer::fit(&[labels(&[Some("Asia"), Some("Asia"), Some("Europe")])]);
        let out = fitted.transform(&[labels(&[None, Some("Africa")])]);

        assert_eq!(out, vec![vec!["Asia".to_string(), "Africa".to_string()]]);
    }
}
