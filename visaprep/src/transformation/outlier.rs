//! Tukey-fence outlier capping.
//!
//! Quantiles are order statistics (`sorted[floor(p * (n - 1))]`), so both
//! quartiles are always observed values and capping is idempotent.

use crate::errors::DataFormatError;
use crate::table::{Column, Table, Value};
use serde::{Deserialize, Serialize};

/// Multiplier of the inter-quartile range.
pub const IQR_FACTOR: f64 = 1.5;

/// The `p` quantile of sorted values, taken as an order statistic.
#[must_use]
pub fn quantile_lower(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (p * (sorted.len() - 1) as f64).floor() as usize;
    sorted.get(idx.min(sorted.len() - 1)).copied()
}

/// Lower and upper capping bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TukeyFences {
    /// `Q1 - 1.5 * IQR`.
    pub lower: f64,
    /// `Q3 + 1.5 * IQR`.
    pub upper: f64,
}

impl TukeyFences {
    /// Computes the fences of the non-null values, or `None` if there are none.
    #[must_use]
    pub fn from_values(values: &[Option<f64>]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile_lower(&sorted, 0.25)?;
        let q3 = quantile_lower(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - IQR_FACTOR * iqr,
            upper: q3 + IQR_FACTOR * iqr,
        })
    }

    /// Clamps one value into the fences.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

/// Returns a copy of the values clamped to their own Tukey fences.
/// Nulls stay null.
#[must_use]
pub fn cap(values: &[Option<f64>]) -> Vec<Option<f64>> {
    match TukeyFences::from_values(values) {
        Some(fences) => values.iter().map(|v| v.map(|x| fences.clamp(x))).collect(),
        None => values.to_vec(),
    }
}

/// Names among `candidates` whose column in `table` has at least
/// `min_distinct` distinct numeric values.
#[must_use]
pub fn continuous_columns(table: &Table, candidates: &[String], min_distinct: usize) -> Vec<String> {
    candidates
        .iter()
        .filter(|name| {
            table
                .column(name)
                .is_some_and(|c| c.distinct_numeric_count() >= min_distinct)
        })
        .cloned()
        .collect()
}

/// Returns a copy of the table with each named column capped at its own
/// fences. Absent names are ignored.
///
/// # Errors
///
/// Returns `DataFormatError` if a capped column no longer fits the table.
pub fn cap_columns(table: &Table, columns: &[String]) -> Result<Table, DataFormatError> {
    let mut out = table.clone();
    for name in columns {
        let Some(column) = table.column(name) else {
            continue;
        };
        let capped = cap(&column.to_f64());
        let values = column
            .values
            .iter()
            .zip(capped)
            .map(|(orig, c)| match (orig, c) {
                (Value::Int(i), Some(x)) if (*i as f64 - x).abs() < f64::EPSILON => Value::Int(*i),
                (_, Some(x)) => Value::Float(x),
                (other, None) => other.clone(),
            })
            .collect();
        out.set_column(Column::new(name, values))?;
    }
    Ok(out)
}
