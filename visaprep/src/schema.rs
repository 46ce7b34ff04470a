//! Dataset schema: declared columns, their types and transformation groups.
//!
//! The schema is a YAML document with the keys `FileName`,
//! `NumberofColumns`, `ColumnNames`, `target_column` and one list per
//! column group. It is read-only and validated when loaded.

use crate::errors::{ConfigError, DataFormatError, PipelineError, SchemaMismatchError};
use crate::table::{Column, Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    /// Signed integer (`int`, `int64`).
    Int,
    /// Floating point (`float`, `float64`).
    Float,
    /// Category label (`category`, `object`, `str`).
    Category,
    /// Boolean (`bool`).
    Bool,
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int" | "int32" | "int64" => Ok(Self::Int),
            "float" | "float32" | "float64" => Ok(Self::Float),
            "category" | "object" | "str" | "string" => Ok(Self::Category),
            "bool" | "boolean" => Ok(Self::Bool),
            other => Err(format!("unknown column type '{other}'")),
        }
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int64"),
            Self::Float => write!(f, "float64"),
            Self::Category => write!(f, "category"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

impl ColumnType {
    /// Converts a cell to this type. Nulls stay null.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch when the cell cannot be converted.
    pub fn coerce(self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let converted = match self {
            Self::Int => value.as_i64().map(Value::Int),
            Self::Float => match value {
                Value::Int(_) | Value::Float(_) => value.as_f64().map(Value::Float),
                _ => None,
            },
            Self::Category => value.as_category().map(Value::Text),
            Self::Bool => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Int(0) => Some(Value::Bool(false)),
                Value::Int(1) => Some(Value::Bool(true)),
                Value::Text(s) => parse_bool(s).map(Value::Bool),
                _ => None,
            },
        };
        converted.ok_or_else(|| format!("value '{value}' is not a valid {self}"))
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" => Some(true),
        "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Column group bound to a fixed preprocessing sub-pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnGroup {
    /// Median imputation, standard scaling.
    Numeric,
    /// Most-frequent imputation, one-hot encoding, scaling without centring.
    OneHot,
    /// Most-frequent imputation, ordinal encoding, scaling without centring.
    Ordinal,
    /// Median imputation, standard scaling, Yeo-Johnson.
    PowerTransform,
}

impl ColumnGroup {
    /// Groups in output order.
    pub const ALL: [Self; 4] = [Self::Numeric, Self::OneHot, Self::Ordinal, Self::PowerTransform];

    /// The schema key listing the group's columns.
    #[must_use]
    pub const fn schema_key(&self) -> &'static str {
        match self {
            Self::Numeric => "Numerical_columns",
            Self::OneHot => "Onehot_columns",
            Self::Ordinal => "Ordinal_columns",
            Self::PowerTransform => "Transformation_columns",
        }
    }

    /// True for groups whose columns hold numbers.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric | Self::PowerTransform)
    }
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::OneHot => write!(f, "one_hot"),
            Self::Ordinal => write!(f, "ordinal"),
            Self::PowerTransform => write!(f, "power_transform"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(rename = "FileName")]
    file_name: String,
    #[serde(rename = "NumberofColumns")]
    number_of_columns: usize,
    #[serde(rename = "ColumnNames")]
    column_names: serde_yaml::Mapping,
    target_column: String,
    #[serde(rename = "Numerical_columns", default)]
    numerical_columns: Vec<String>,
    #[serde(rename = "Onehot_columns", default)]
    onehot_columns: Vec<String>,
    #[serde(rename = "Ordinal_columns", alias = "Oridnal_columns", default)]
    ordinal_columns: Vec<String>,
    #[serde(rename = "Transformation_columns", default)]
    transformation_columns: Vec<String>,
}

/// Validated dataset schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Expected file name of each split.
    pub file_name: String,
    /// Expected number of columns.
    pub number_of_columns: usize,
    /// Declared columns and types, in document order.
    pub columns: Vec<(String, ColumnType)>,
    /// The label column.
    pub target_column: String,
    /// Columns of each group, in [`ColumnGroup::ALL`] order.
    pub groups: Vec<(ColumnGroup, Vec<String>)>,
}

impl DatasetSchema {
    /// Parses and validates a schema document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is malformed, the target is not
    /// declared, or the column groups overlap, contain the target or name
    /// undeclared columns.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let doc: SchemaDocument = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new(format!("invalid schema: {e}")))?;

        let mut columns = Vec::with_capacity(doc.column_names.len());
        for (key, value) in doc.column_names {
            let name = key
                .as_str()
                .ok_or_else(|| ConfigError::new("column names must be strings").with_key("ColumnNames"))?
                .to_string();
            let ty: ColumnType = serde_yaml::from_value(value).map_err(|e| {
                ConfigError::new(format!("column '{name}': {e}")).with_key("ColumnNames")
            })?;
            columns.push((name, ty));
        }

        let schema = Self {
            file_name: doc.file_name,
            number_of_columns: doc.number_of_columns,
            columns,
            target_column: doc.target_column,
            groups: vec![
                (ColumnGroup::Numeric, doc.numerical_columns),
                (ColumnGroup::OneHot, doc.onehot_columns),
                (ColumnGroup::Ordinal, doc.ordinal_columns),
                (ColumnGroup::PowerTransform, doc.transformation_columns),
            ],
        };
        schema.check_groups()?;
        Ok(schema)
    }

    /// Reads and validates a schema file.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file cannot be read and
    /// `PipelineError::Config` if it is invalid.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::io(path, e))?;
        Ok(Self::from_yaml_str(&contents).map_err(|e| e.with_path(path))?)
    }

    fn check_groups(&self) -> Result<(), ConfigError> {
        let declared: HashSet<&str> = self.columns.iter().map(|(n, _)| n.as_str()).collect();
        if !declared.contains(self.target_column.as_str()) {
            return Err(ConfigError::new(format!(
                "target column '{}' is not declared in ColumnNames",
                self.target_column
            ))
            .with_key("target_column"));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for (group, names) in &self.groups {
            for name in names {
                let key = group.schema_key();
                if *name == self.target_column {
                    return Err(ConfigError::new(format!(
                        "target column '{name}' cannot be a feature"
                    ))
                    .with_key(key));
                }
                if !declared.contains(name.as_str()) {
                    return Err(ConfigError::new(format!(
                        "column '{name}' is not declared in ColumnNames"
                    ))
                    .with_key(key));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::new(format!(
                        "column '{name}' belongs to more than one group"
                    ))
                    .with_key(key));
                }
            }
        }
        Ok(())
    }

    /// Declared column names, in document order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Declared type of a column.
    #[must_use]
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Columns of a group.
    #[must_use]
    pub fn group(&self, group: ColumnGroup) -> &[String] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map_or(&[], |(_, names)| names.as_slice())
    }

    /// Checks a table's columns against the schema and converts every cell
    /// to its declared type.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatchError` listing every undeclared column, or
    /// `DataFormatError` for the first cell that does not convert.
    pub fn coerce(&self, table: &Table, file: &Path) -> Result<Table, PipelineError> {
        let unknown: Vec<String> = table
            .column_names()
            .into_iter()
            .filter(|name| self.column_type(name).is_none())
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(SchemaMismatchError::new(file, unknown).into());
        }

        let mut columns = Vec::with_capacity(table.n_cols());
        for column in table.columns() {
            // Presence checked above.
            let ty = self.column_type(&column.name).unwrap_or(ColumnType::Category);
            let values = column
                .values
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    ty.coerce(v).map_err(|msg| {
                        DataFormatError::new(format!("row {}: {msg}", row + 1))
                            .with_column(&column.name)
                            .with_file(file)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            columns.push(Column::new(&column.name, values));
        }
        Ok(Table::new(columns)?)
    }
}
