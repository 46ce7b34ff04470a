//! CSV encoding and decoding for [`Table`].

use super::{Column, Table, Value};
use crate::errors::{DataFormatError, PipelineError};
use std::io::Read;
use std::path::Path;

impl Table {
    /// Parses CSV from a reader. The first record is the header.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if the header is missing or a record has a
    /// different number of fields than the header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DataFormatError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DataFormatError::new(format!("failed to read header: {e}")))?
            .clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(DataFormatError::new("file has no header row"));
        }

        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column::new(name.trim(), Vec::new()))
            .collect();

        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| {
                DataFormatError::new(format!("malformed record {}: {e}", line + 1))
            })?;
            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.values.push(Value::infer(field));
            }
        }

        Ok(Self { columns })
    }

    /// Parses CSV from an in-memory buffer.
    ///
    /// # Errors
    ///
    /// See [`Table::from_csv_reader`].
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DataFormatError> {
        Self::from_csv_reader(bytes)
    }

    /// Reads a CSV file from disk.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file cannot be read and
    /// `PipelineError::DataFormat` if it is malformed.
    pub async fn read_csv(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::io(path, e))?;
        Self::from_csv_bytes(&bytes).map_err(|e| e.with_file(path).into())
    }

    /// Encodes the table as CSV. Nulls are written as empty fields.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if the writer fails.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, DataFormatError> {
        let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
        let map_err = |e: csv::Error| DataFormatError::new(format!("failed to encode CSV: {e}"));

        wtr.write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(map_err)?;
        for row in 0..self.n_rows() {
            wtr.write_record(self.columns.iter().map(|c| c.values[row].to_string()))
                .map_err(map_err)?;
        }

        wtr.into_inner()
            .map_err(|e| DataFormatError::new(format!("failed to flush CSV: {e}")))
    }

    /// Writes the table to a CSV file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file cannot be written.
    pub async fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }
        let bytes = self.to_csv_bytes().map_err(|e| e.with_file(path))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| PipelineError::io(path, e))
    }
}
