//! Schema checks on a single table.

use crate::schema::DatasetSchema;
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Text written in place of nulls by [`SchemaValidator::replace_nulls`].
pub const NULL_SENTINEL: &str = "NULL";

/// One of the four schema checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    /// The file name equals the schema's `FileName`.
    FileName,
    /// The column count equals `NumberofColumns`.
    ColumnCount,
    /// The header names equal the declared names as a multiset.
    ColumnNames,
    /// No column is entirely null.
    WholeColumnMissing,
}

impl ValidationCheck {
    /// All checks in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::FileName,
        Self::ColumnCount,
        Self::ColumnNames,
        Self::WholeColumnMissing,
    ];
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileName => write!(f, "file_name"),
            Self::ColumnCount => write!(f, "column_count"),
            Self::ColumnNames => write!(f, "column_names"),
            Self::WholeColumnMissing => write!(f, "whole_column_missing"),
        }
    }
}

/// Outcome of every check on one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCheckReport {
    /// The file name that was checked.
    pub file_name: String,
    /// Check results in evaluation order.
    pub results: Vec<(ValidationCheck, bool)>,
}

impl FileCheckReport {
    /// True iff every check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }

    /// The checks that returned false.
    #[must_use]
    pub fn failed_checks(&self) -> Vec<ValidationCheck> {
        self.results
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(check, _)| *check)
            .collect()
    }

    /// Result of one check.
    #[must_use]
    pub fn result(&self, check: ValidationCheck) -> Option<bool> {
        self.results
            .iter()
            .find(|(c, _)| *c == check)
            .map(|(_, ok)| *ok)
    }
}

/// Runs the schema checks against one loaded table.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    schema: &'a DatasetSchema,
    table: &'a Table,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a validator for a table.
    #[must_use]
    pub const fn new(schema: &'a DatasetSchema, table: &'a Table) -> Self {
        Self { schema, table }
    }

    /// True iff `actual_name` equals the schema's file name exactly.
    #[must_use]
    pub fn validate_filename(&self, actual_name: &str) -> bool {
        self.schema.file_name == actual_name
    }

    /// True iff the table has the declared number of columns.
    #[must_use]
    pub fn validate_column_count(&self) -> bool {
        self.table.n_cols() == self.schema.number_of_columns
    }

    /// True iff the header names equal the declared names, ignoring order.
    ///
    /// Names are compared as multisets, so a duplicated header fails.
    #[must_use]
    pub fn check_column_names(&self) -> bool {
        fn counts<'n>(names: impl IntoIterator<Item = &'n str>) -> HashMap<&'n str, usize> {
            let mut map = HashMap::new();
            for name in names {
                *map.entry(name).or_insert(0) += 1;
            }
            map
        }
        counts(self.table.column_names()) == counts(self.schema.column_names())
    }

    /// True iff no column consists solely of nulls.
    #[must_use]
    pub fn missing_values_whole_column(&self) -> bool {
        !self.table.columns().iter().any(|c| c.is_all_null())
    }

    /// Returns a copy of the table with nulls replaced by [`NULL_SENTINEL`].
    ///
    /// Nothing is persisted.
    #[must_use]
    pub fn replace_nulls(&self) -> Table {
        self.table.fill_nulls(&Value::from(NULL_SENTINEL))
    }

    /// Evaluates every check without short-circuiting.
    #[must_use]
    pub fn run_all(&self, actual_name: &str) -> FileCheckReport {
        let results = ValidationCheck::ALL
            .iter()
            .map(|&check| {
                let ok = match check {
                    ValidationCheck::FileName => self.validate_filename(actual_name),
                    ValidationCheck::ColumnCount => self.validate_column_count(),
                    ValidationCheck::ColumnNames => self.check_column_names(),
                    ValidationCheck::WholeColumnMissing => self.missing_values_whole_column(),
                };
                (check, ok)
            })
            .collect();
        FileCheckReport {
            file_name: actual_name.to_string(),
            results,
        }
    }
}
