//! Categorical encoders.
//!
//! Categories are learned from the training split and sorted. Labels unseen
//! during fitting encode as all zeros (one-hot) or as `-1` (ordinal).

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Code assigned by the ordinal encoder to unseen labels.
pub const UNKNOWN_ORDINAL: f64 = -1.0;

fn learn_categories(columns: &[Vec<String>]) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|c| {
            c.iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .collect()
}

fn n_rows(columns: &[Vec<String>]) -> usize {
    columns.first().map_or(0, Vec::len)
}

/// One indicator column per learned category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedOneHotEncoder {
    /// Sorted categories per input column.
    pub categories: Vec<Vec<String>>,
}

impl FittedOneHotEncoder {
    /// Learns the categories of each column.
    #[must_use]
    pub fn fit(columns: &[Vec<String>]) -> Self {
        Self {
            categories: learn_categories(columns),
        }
    }

    /// Number of output columns.
    #[must_use]
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Output column names as `<column>_<category>`.
    #[must_use]
    pub fn feature_names(&self, input_names: &[String]) -> Vec<String> {
        input_names
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{name}_{c}")))
            .collect()
    }

    /// Encodes rows as indicator columns.
    #[must_use]
    pub fn transform(&self, columns: &[Vec<String>]) -> Array2<f64> {
        let mut out = Array2::zeros((n_rows(columns), self.n_features_out()));
        let mut offset = 0;
        for (column, cats) in columns.iter().zip(&self.categories) {
            for (row, label) in column.iter().enumerate() {
                if let Ok(pos) = cats.binary_search(label) {
                    out[[row, offset + pos]] = 1.0;
                }
            }
            offset += cats.len();
        }
        out
    }
}

/// One integer code per learned category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedOrdinalEncoder {
    /// Sorted categories per input column.
    pub categories: Vec<Vec<String>>,
}

impl FittedOrdinalEncoder {
    /// Learns the categories of each column.
    #[must_use]
    pub fn fit(columns: &[Vec<String>]) -> Self {
        Self {
            categories: learn_categories(columns),
        }
    }

    /// Encodes each label as its index among the sorted categories.
    #[must_use]
    pub fn transform(&self, columns: &[Vec<String>]) -> Array2<f64> {
        let mut out = Array2::zeros((n_rows(columns), columns.len()));
        for (j, (column, cats)) in columns.iter().zip(&self.categories).enumerate() {
            for (row, label) in column.iter().enumerate() {
                out[[row, j]] = cats
                    .binary_search(label)
                    .map_or(UNKNOWN_ORDINAL, |pos| pos as f64);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cols(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|c| c.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    #[test]
    fn test_one_hot_encoding() {
        let train = cols(&[&["Asia", "Europe", "Asia"], &["Y", "N", "N"]]);
        let encoder = FittedOneHotEncoder::fit(&train);

        assert_eq!(encoder.n_features_out(), 4);
        assert_eq!(
            encoder.transform(&train),
            array![
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 1.0, 0.0],
                [1.0, 0.0, 1.0, 0.0]
            ]
        );
    }

    #[test]
    fn test_one_hot_unknown_is_zero() {
        let encoder = FittedOneHotEncoder::fit(&cols(&[&["a", "b"]]));
        assert_eq!(encoder.transform(&cols(&[&["c"]])), array![[0.0, 0.0]]);
    }

    #[test]
    fn test_one_hot_feature_names() {
        let encoder = FittedOneHotEncoder::fit(&cols(&[&["Y", "N"]]));
        assert_eq!(
            encoder.feature_names(&["full_time".to_string()]),
            vec!["full_time_N", "full_time_Y"]
        );
    }

    #[test]
    fn test_ordinal_encoding() {
        let encoder = FittedOrdinalEncoder::fit(&cols(&[&["Master's", "Bachelor's", "High School"]]));

        assert_eq!(
            encoder.transform(&cols(&[&["High School", "Master's", "Doctorate"]])),
            array![[1.0], [2.0], [UNKNOWN_ORDINAL]]
        );
    }
}
