//! Feature derivation and the seeded train/test split.

use crate::errors::DataFormatError;
use crate::table::{Column, Table, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Derived column: years since establishment.
pub const COLUMN_COMPANY_AGE: &str = "company_age";
/// Raw column: year of establishment.
pub const COLUMN_YEAR_ESTB: &str = "yr_of_estab";
/// Raw column: application identifier.
pub const COLUMN_ID: &str = "case_id";
/// Label column.
pub const COLUMN_CASE_STATUS: &str = "case_status";
/// Label value mapped to the positive class.
pub const DENIED: &str = "Denied";

/// Derives `company_age`, drops `case_id` and `yr_of_estab` and binarizes
/// `case_status` (`Denied` is 1, anything else including null is 0).
///
/// # Errors
///
/// Returns `DataFormatError` if an expected column is missing or a
/// `yr_of_estab` value is not an integer.
pub fn prepare(raw: &Table, current_year: i64) -> Result<Table, DataFormatError> {
    raw.require_column(COLUMN_ID)?;
    let years = raw.require_column(COLUMN_YEAR_ESTB)?;
    let status = raw.require_column(COLUMN_CASE_STATUS)?;

    let company_age = years
        .values
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            Value::Null => Ok(Value::Null),
            other => other
                .as_i64()
                .map(|year| Value::Int(current_year - year))
                .ok_or_else(|| {
                    DataFormatError::new(format!("row {}: '{other}' is not a year", row + 1))
                        .with_column(COLUMN_YEAR_ESTB)
                }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let label = status
        .values
        .iter()
        .map(|v| Value::Int(i64::from(matches!(v, Value::Text(s) if s == DENIED))))
        .collect();

    let mut table = raw.without_columns(&[COLUMN_ID, COLUMN_YEAR_ESTB]);
    table.set_column(Column::new(COLUMN_CASE_STATUS, label))?;
    table.set_column(Column::new(COLUMN_COMPANY_AGE, company_age))?;
    Ok(table)
}

/// Rows assigned to the test split: `ceil(test_size * n_rows)`.
#[must_use]
pub fn test_row_count(n_rows: usize, test_size: f64) -> usize {
    ((n_rows as f64) * test_size).ceil() as usize
}

/// Shuffles row indices with a seeded RNG and splits them into train and
/// test tables. The same input and seed always give the same split.
///
/// # Errors
///
/// Returns `DataFormatError` if either split would be empty.
pub fn train_test_split(
    table: &Table,
    test_size: f64,
    random_state: u64,
) -> Result<(Table, Table), DataFormatError> {
    let n_rows = table.n_rows();
    let n_test = test_row_count(n_rows, test_size);
    if n_test == 0 || n_test >= n_rows {
        return Err(DataFormatError::new(format!(
            "cannot split {n_rows} rows with test_size {test_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    Ok((table.take_rows(train_idx), table.take_rows(test_idx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw() -> Table {
        Table::from_csv_bytes(
            b"case_id,continent,yr_of_estab,case_status\n\
              EZYV01,Asia,2000,Denied\n\
              EZYV02,Europe,1990,Certified\n\
              EZYV03,Asia,,\n",
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_derives_and_drops() {
        let table = prepare(&raw(), 2024).unwrap();

        assert_eq!(table.column_names(), vec!["continent", "case_status", "company_age"]);
        assert_eq!(
            table.column("company_age").unwrap().values,
            vec![Value::Int(24), Value::Int(34), Value::Null]
        );
        assert_eq!(
            table.column("case_status").unwrap().values,
            vec![Value::Int(1), Value::Int(0), Value::Int(0)]
        );
        assert!(table.column("case_id").is_none());
        assert!(table.column("yr_of_estab").is_none());
    }

    #[test]
    fn test_prepare_missing_column() {
        let table = raw().without_columns(&["case_id"]);
        let err = prepare(&table, 2024).unwrap_err();
        assert_eq!(err.column.as_deref(), Some("case_id"));
    }

    #[test]
    fn test_prepare_bad_year() {
        let table = Table::from_csv_bytes(b"case_id,yr_of_estab,case_status\nA,old,Denied\n").unwrap();
        let err = prepare(&table, 2024).unwrap_err();
        assert_eq!(err.column.as_deref(), Some("yr_of_estab"));
    }

    #[test]
    fn test_test_row_count_rounds_up() {
        assert_eq!(test_row_count(10, 0.2), 2);
        assert_eq!(test_row_count(11, 0.2), 3);
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let values: Vec<Value> = (0..50).map(Value::Int).collect();
        let table = Table::new(vec![Column::new("id", values)]).unwrap();

        let (train_a, test_a) = train_test_split(&table, 0.2, 42).unwrap();
        let (train_b, test_b) = train_test_split(&table, 0.2, 42).unwrap();

        assert_eq!(train_a.n_rows(), 40);
        assert_eq!(test_a.n_rows(), 10);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let (_, test_c) = train_test_split(&table, 0.2, 7).unwrap();
        assert_ne!(test_a, test_c);
    }

    #[test]
    fn test_split_partitions_rows() {
        let values: Vec<Value> = (0..20).map(Value::Int).collect();
        let table = Table::new(vec![Column::new("id", values)]).unwrap();

        let (train, test) = train_test_split(&table, 0.25, 1).unwrap();
        let mut ids: Vec<i64> = train
            .column("id")
            .unwrap()
            .values
            .iter()
            .chain(&test.column("id").unwrap().values)
            .filter_map(Value::as_i64)
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_too_small() {
        let table = Table::new(vec![Column::new("id", vec![Value::Int(1)])]).unwrap();
        assert!(train_test_split(&table, 0.2, 42).is_err());
    }
}
