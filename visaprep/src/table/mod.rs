//! Minimal column-major table used by every stage.
//!
//! A [`Table`] is an ordered list of named [`Column`]s of equal length.
//! Header names are not required to be unique so that malformed inputs can
//! be represented and rejected by validation rather than by the reader.

mod csv_io;
mod value;

pub use value::{Value, NULL_TOKENS};

use crate::errors::DataFormatError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Header name.
    pub name: String,
    /// Cells, one per row.
    pub values: Vec<Value>,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of non-null cells.
    #[must_use]
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    /// True if every cell is null (vacuously true for an empty column).
    #[must_use]
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }

    /// Numeric view of the column; `None` entries are nulls or non-numeric.
    #[must_use]
    pub fn to_f64(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_f64).collect()
    }

    /// Number of distinct numeric values. Nulls, when present, count as one
    /// more value; non-numeric cells are ignored.
    #[must_use]
    pub fn distinct_numeric_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| v.is_null() || v.as_f64().is_some())
            .map(|v| v.as_f64().map(f64::to_bits))
            .collect::<HashSet<_>>()
            .len()
    }
}

/// An in-memory table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Creates a table from columns of equal length.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if the columns differ in length.
    pub fn new(columns: Vec<Column>) -> Result<Self, DataFormatError> {
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(DataFormatError::new(format!(
                    "column has {} rows, expected {expected}",
                    bad.values.len()
                ))
                .with_column(&bad.name));
            }
        }
        Ok(Self { columns })
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Header names in file order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up the first column with the given name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column, failing with a `DataFormatError` if absent.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` naming the missing column.
    pub fn require_column(&self, name: &str) -> Result<&Column, DataFormatError> {
        self.column(name)
            .ok_or_else(|| DataFormatError::missing_column(name))
    }

    /// Appends a column, or replaces the existing column with the same name.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if the length does not match the table.
    pub fn set_column(&mut self, column: Column) -> Result<(), DataFormatError> {
        if !self.columns.is_empty() && column.values.len() != self.n_rows() {
            return Err(DataFormatError::new(format!(
                "column has {} rows, expected {}",
                column.values.len(),
                self.n_rows()
            ))
            .with_column(&column.name));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Returns a copy without the named columns.
    #[must_use]
    pub fn without_columns(&self, names: &[&str]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Returns a copy with only the given rows, in the given order.
    ///
    /// Indices must be in range.
    #[must_use]
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(&c.name, indices.iter().map(|&i| c.values[i].clone()).collect()))
                .collect(),
        }
    }

    /// Returns a copy with every null replaced by `fill`.
    #[must_use]
    pub fn fill_nulls(&self, fill: &Value) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| {
                    Column::new(
                        &c.name,
                        c.values
                            .iter()
                            .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}
