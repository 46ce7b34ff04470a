//! Grouped preprocessing over a table.
//!
//! Each [`ColumnGroup`] is bound to a fixed chain of [`Step`]s through
//! [`GROUP_STEPS`]. Fitting walks each chain on the training columns;
//! transforming replays the fitted chain. Group outputs are concatenated in
//! [`ColumnGroup::ALL`] order and columns in no group are dropped.

use super::encoder::{FittedOneHotEncoder, FittedOrdinalEncoder};
use super::imputer::{FittedMedianImputer, FittedModeImputer};
use super::persist::{load_object, save_object};
use super::power::FittedPowerTransformer;
use super::scaler::FittedStandardScaler;
use crate::errors::{DataFormatError, PipelineError};
use crate::schema::{ColumnGroup, DatasetSchema};
use crate::table::Table;
use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One preprocessing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Fill numeric nulls with the training median.
    ImputeMedian,
    /// Fill categorical nulls with the most frequent training label.
    ImputeMostFrequent,
    /// Indicator column per category.
    OneHotEncode,
    /// Integer code per category.
    OrdinalEncode,
    /// Subtract the mean and divide by the standard deviation.
    StandardScale,
    /// Divide by the standard deviation only.
    ScaleWithoutCentring,
    /// Yeo-Johnson followed by standardisation.
    YeoJohnson,
}

/// The sub-pipeline bound to each column group.
pub const GROUP_STEPS: [(ColumnGroup, &[Step]); 4] = [
    (ColumnGroup::Numeric, &[Step::ImputeMedian, Step::StandardScale]),
    (
        ColumnGroup::OneHot,
        &[Step::ImputeMostFrequent, Step::OneHotEncode, Step::ScaleWithoutCentring],
    ),
    (
        ColumnGroup::Ordinal,
        &[Step::ImputeMostFrequent, Step::OrdinalEncode, Step::ScaleWithoutCentring],
    ),
    (
        ColumnGroup::PowerTransform,
        &[Step::ImputeMedian, Step::StandardScale, Step::YeoJohnson],
    ),
];

/// Steps of a group.
#[must_use]
pub fn steps_for(group: ColumnGroup) -> &'static [Step] {
    GROUP_STEPS
        .iter()
        .find(|(g, _)| *g == group)
        .map_or(&[] as &[Step], |&(_, steps)| steps)
}

/// Data flowing between steps.
#[derive(Debug, Clone)]
enum Block {
    Numeric(Vec<Vec<Option<f64>>>),
    Categorical(Vec<Vec<Option<String>>>),
    Labels(Vec<Vec<String>>),
    Matrix(Array2<f64>),
}

impl Block {
    fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric columns",
            Self::Categorical(_) => "categorical columns",
            Self::Labels(_) => "imputed labels",
            Self::Matrix(_) => "matrix",
        }
    }
}

fn columns_to_matrix(columns: Vec<Vec<f64>>, n_rows: usize) -> Array2<f64> {
    let n_cols = columns.len();
    Array2::from_shape_fn((n_rows, n_cols), |(i, j)| columns[j][i])
}

/// A fitted [`Step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedStep {
    /// Fitted median imputer.
    MedianImputer(FittedMedianImputer),
    /// Fitted most-frequent imputer.
    ModeImputer(FittedModeImputer),
    /// Fitted one-hot encoder.
    OneHotEncoder(FittedOneHotEncoder),
    /// Fitted ordinal encoder.
    OrdinalEncoder(FittedOrdinalEncoder),
    /// Fitted scaler (with or without centring).
    Scaler(FittedStandardScaler),
    /// Fitted Yeo-Johnson transformer.
    PowerTransformer(FittedPowerTransformer),
}

impl FittedStep {
    fn fit(step: Step, input: &Block) -> Result<Self, DataFormatError> {
        let fitted = match (step, input) {
            (Step::ImputeMedian, Block::Numeric(c)) => Self::MedianImputer(FittedMedianImputer::fit(c)),
            (Step::ImputeMostFrequent, Block::Categorical(c)) => {
                Self::ModeImputer(FittedModeImputer::fit(c))
            }
            (Step::OneHotEncode, Block::Labels(c)) => Self::OneHotEncoder(FittedOneHotEncoder::fit(c)),
            (Step::OrdinalEncode, Block::Labels(c)) => {
                Self::OrdinalEncoder(FittedOrdinalEncoder::fit(c))
            }
            (Step::StandardScale, Block::Matrix(m)) => Self::Scaler(FittedStandardScaler::fit(m, true)),
            (Step::ScaleWithoutCentring, Block::Matrix(m)) => {
                Self::Scaler(FittedStandardScaler::fit(m, false))
            }
            (Step::YeoJohnson, Block::Matrix(m)) => {
                Self::PowerTransformer(FittedPowerTransformer::fit(m))
            }
            (step, block) => {
                return Err(DataFormatError::new(format!(
                    "step {step:?} cannot consume {}",
                    block.kind()
                )))
            }
        };
        Ok(fitted)
    }

    fn transform(&self, input: Block) -> Result<Block, DataFormatError> {
        let out = match (self, input) {
            (Self::MedianImputer(f), Block::Numeric(c)) => {
                let n_rows = c.first().map_or(0, Vec::len);
                Block::Matrix(columns_to_matrix(f.transform(&c), n_rows))
            }
            (Self::ModeImputer(f), Block::Categorical(c)) => Block::Labels(f.transform(&c)),
            (Self::OneHotEncoder(f), Block::Labels(c)) => Block::Matrix(f.transform(&c)),
            (Self::OrdinalEncoder(f), Block::Labels(c)) => Block::Matrix(f.transform(&c)),
            (Self::Scaler(f), Block::Matrix(m)) => Block::Matrix(f.transform(&m)),
            (Self::PowerTransformer(f), Block::Matrix(m)) => Block::Matrix(f.transform(&m)),
            (_, block) => {
                return Err(DataFormatError::new(format!(
                    "fitted step cannot consume {}",
                    block.kind()
                )))
            }
        };
        Ok(out)
    }
}

/// A fitted group: its columns and fitted steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedGroup {
    /// The group.
    pub group: ColumnGroup,
    /// Input columns, in schema order.
    pub columns: Vec<String>,
    /// Fitted chain.
    pub steps: Vec<FittedStep>,
}

impl FittedGroup {
    fn extract(&self, table: &Table) -> Result<Block, DataFormatError> {
        extract(self.group, &self.columns, table)
    }

    fn transform(&self, table: &Table) -> Result<Array2<f64>, DataFormatError> {
        let mut block = self.extract(table)?;
        for step in &self.steps {
            block = step.transform(block)?;
        }
        match block {
            Block::Matrix(m) => Ok(m),
            other => Err(DataFormatError::new(format!(
                "{} group produced {} instead of a matrix",
                self.group,
                other.kind()
            ))),
        }
    }

    /// Output column names.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .find_map(|s| match s {
                FittedStep::OneHotEncoder(enc) => Some(enc.feature_names(&self.columns)),
                _ => None,
            })
            .unwrap_or_else(|| self.columns.clone())
    }
}

fn extract(group: ColumnGroup, columns: &[String], table: &Table) -> Result<Block, DataFormatError> {
    if group.is_numeric() {
        let mut out = Vec::with_capacity(columns.len());
        for name in columns {
            let column = table.require_column(name)?;
            let values = column
                .values
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    if v.is_null() {
                        Ok(None)
                    } else {
                        v.as_f64().map(Some).ok_or_else(|| {
                            DataFormatError::new(format!("row {}: '{v}' is not numeric", row + 1))
                                .with_column(name)
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            out.push(values);
        }
        Ok(Block::Numeric(out))
    } else {
        let mut out = Vec::with_capacity(columns.len());
        for name in columns {
            let column = table.require_column(name)?;
            out.push(column.values.iter().map(|v| v.as_category()).collect());
        }
        Ok(Block::Categorical(out))
    }
}

/// Unfitted transformer built from the schema's column groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTransformer {
    groups: Vec<(ColumnGroup, Vec<String>)>,
}

impl ColumnTransformer {
    /// Binds every non-empty schema group to its sub-pipeline.
    #[must_use]
    pub fn from_schema(schema: &DatasetSchema) -> Self {
        Self::new(
            ColumnGroup::ALL
                .iter()
                .map(|&g| (g, schema.group(g).to_vec()))
                .collect(),
        )
    }

    /// Creates a transformer from explicit groups. Empty groups are skipped
    /// and groups are reordered into output order.
    #[must_use]
    pub fn new(mut groups: Vec<(ColumnGroup, Vec<String>)>) -> Self {
        groups.retain(|(_, cols)| !cols.is_empty());
        groups.sort_by_key(|(g, _)| ColumnGroup::ALL.iter().position(|x| x == g));
        Self { groups }
    }

    /// Fits every group on the table.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if a grouped column is absent or holds a
    /// value of the wrong kind.
    pub fn fit(&self, table: &Table) -> Result<FittedColumnTransformer, DataFormatError> {
        let mut fitted_groups = Vec::with_capacity(self.groups.len());
        for (group, columns) in &self.groups {
            let mut block = extract(*group, columns, table)?;
            let mut steps = Vec::new();
            for &step in steps_for(*group) {
                let fitted = FittedStep::fit(step, &block)?;
                block = fitted.transform(block)?;
                steps.push(fitted);
            }
            fitted_groups.push(FittedGroup {
                group: *group,
                columns: columns.clone(),
                steps,
            });
        }
        Ok(FittedColumnTransformer {
            groups: fitted_groups,
        })
    }
}

/// The persisted preprocessing object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedColumnTransformer {
    /// Fitted groups in output order.
    pub groups: Vec<FittedGroup>,
}

impl FittedColumnTransformer {
    /// Transforms a table into a feature matrix.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if a grouped column is absent or holds a
    /// value of the wrong kind.
    pub fn transform(&self, table: &Table) -> Result<Array2<f64>, DataFormatError> {
        let blocks = self
            .groups
            .iter()
            .map(|g| g.transform(table))
            .collect::<Result<Vec<_>, _>>()?;
        if blocks.is_empty() {
            return Ok(Array2::zeros((table.n_rows(), 0)));
        }
        let views: Vec<_> = blocks.iter().map(Array2::view).collect();
        concatenate(Axis(1), &views)
            .map_err(|e| DataFormatError::new(format!("failed to join group outputs: {e}")))
    }

    /// Output column names, in order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.groups.iter().flat_map(FittedGroup::feature_names).collect()
    }

    /// Number of output columns.
    #[must_use]
    pub fn n_features_out(&self) -> usize {
        self.feature_names().len()
    }

    /// Writes the transformer with bincode.
    ///
    /// # Errors
    ///
    /// Returns a `SerializationError` or an IO error.
    pub async fn save(&self, path: &Path) -> Result<(), PipelineError> {
        save_object(path, self).await
    }

    /// Reads a transformer written by [`FittedColumnTransformer::save`].
    ///
    /// # Errors
    ///
    /// Returns a `SerializationError` or an IO error.
    pub async fn load(path: &Path) -> Result<Self, PipelineError> {
        load_object(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn table() -> Table {
        Table::from_csv_bytes(
            b"wage,employees,continent,education,unused\n\
              100.0,10,Asia,Master's,x\n\
              ,20,Europe,Bachelor's,y\n\
              300.0,30,,Master's,z\n\
              200.0,,Asia,High School,w\n",
        )
        .unwrap()
    }

    fn transformer() -> ColumnTransformer {
        ColumnTransformer::new(vec![
            (ColumnGroup::PowerTransform, vec!["employees".to_string()]),
            (ColumnGroup::OneHot, vec!["continent".to_string()]),
            (ColumnGroup::Numeric, vec!["wage".to_string()]),
            (ColumnGroup::Ordinal, vec!["education".to_string()]),
        ])
    }

    #[test]
    fn test_group_table_binds_every_group() {
        for group in ColumnGroup::ALL {
            assert!(!steps_for(group).is_empty());
        }
        assert_eq!(steps_for(ColumnGroup::OneHot)[1], Step::OneHotEncode);
        assert_eq!(steps_for(ColumnGroup::Ordinal)[1], Step::OrdinalEncode);
    }

    #[test]
    fn test_output_order_and_shape() {
        let fitted = transformer().fit(&table()).unwrap();

        assert_eq!(
            fitted.feature_names(),
            vec!["wage", "continent_Asia", "continent_Europe", "education", "employees"]
        );
        let out = fitted.transform(&table()).unwrap();
        assert_eq!(out.dim(), (4, 5));
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_numeric_group_imputes_then_standardises() {
        let fitted = transformer().fit(&table()).unwrap();
        let out = fitted.transform(&table()).unwrap();

        // wage median of [100, 300, 200] is 200, so the column is [100, 200, 300, 200]
        let wage = out.column(0);
        assert!(wage.sum().abs() < 1e-9);
        assert!((wage[1] - wage[3]).abs() < 1e-12);
    }

    #[test]
    fn test_one_hot_is_not_centred() {
        let fitted = transformer().fit(&table()).unwrap();
        let out = fitted.transform(&table()).unwrap();

        // Unseen-free column of indicators keeps zeros at zero.
        assert_eq!(out[[1, 1]], 0.0);
        assert!(out[[0, 1]] > 0.0);
    }

    #[test]
    fn test_transform_uses_fitted_state() {
        let fitted = transformer().fit(&table()).unwrap();
        let single = Table::from_csv_bytes(
            b"wage,employees,continent,education\n200.0,10,Asia,Master's\n",
        )
        .unwrap();

        let out = fitted.transform(&single).unwrap();
        let full = fitted.transform(&table()).unwrap();

        assert_eq!(out.nrows(), 1);
        assert!((out[[0, 0]] - full[[3, 0]]).abs() < 1e-12);
    }

    #[test]
    fn test_missing_grouped_column() {
        let fitted = transformer().fit(&table()).unwrap();
        let partial = table().without_columns(&["education"]);

        let err = fitted.transform(&partial).unwrap_err();
        assert_eq!(err.column.as_deref(), Some("education"));
    }

    #[test]
    fn test_non_numeric_value_in_numeric_group() {
        let bad = Table::from_csv_bytes(b"wage\nlots\n").unwrap();
        let transformer = ColumnTransformer::new(vec![(ColumnGroup::Numeric, vec!["wage".to_string()])]);

        assert!(transformer.fit(&bad).is_err());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessed.bin");
        let fitted = transformer().fit(&table()).unwrap();

        fitted.save(&path).await.unwrap();
        let loaded = FittedColumnTransformer::load(&path).await.unwrap();

        assert_eq!(loaded, fitted);
        assert_eq!(
            loaded.transform(&table()).unwrap(),
            fitted.transform(&table()).unwrap()
        );
    }
}
