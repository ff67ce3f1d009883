//! Scalar control-variable columns.
use std::{fs::File, path::Path};

use arrow_array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, RecordBatchReader,
};
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::file::reader::ChunkReader;

use crate::errors::DenseMatrixProviderError;

/// Reads a numeric column as one `f64` per row.
///
/// `Float32`, `Float64`, `Int32` and `Int64` columns are accepted. Integers
/// beyond 2^53 lose precision.
///
/// # Errors
/// Returns [`DenseMatrixProviderError::ColumnNotFound`] for an unknown
/// column, [`DenseMatrixProviderError::InvalidControlType`] for other types,
/// [`DenseMatrixProviderError::NullControl`] for null cells and Parquet or
/// Arrow errors from decoding.
pub fn read_control_column<R>(reader: R, column: &str) -> Result<Vec<f64>, DenseMatrixProviderError>
where
    R: ChunkReader + Send + 'static,
{
    let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
    let mask = ProjectionMask::columns(builder.parquet_schema(), [column]);
    let reader = builder.with_projection(mask).build()?;
    let column_index = reader.schema().index_of(column).map_err(|_| {
        DenseMatrixProviderError::ColumnNotFound {
            column: column.to_owned(),
        }
    })?;

    let mut values = Vec::new();
    for batch in reader {
        let batch = batch?;
        append_scalars(batch.column(column_index), column, &mut values)?;
    }
    Ok(values)
}

/// Reads a numeric column from a Parquet file.
///
/// # Errors
/// Returns [`DenseMatrixProviderError::Io`] when the file cannot be opened,
/// plus every error of [`read_control_column`].
pub fn read_control_column_path(
    path: impl AsRef<Path>,
    column: &str,
) -> Result<Vec<f64>, DenseMatrixProviderError> {
    read_control_column(File::open(path)?, column)
}

fn append_scalars(
    array: &ArrayRef,
    column: &str,
    out: &mut Vec<f64>,
) -> Result<(), DenseMatrixProviderError> {
    let start = out.len();
    let any = array.as_any();
    let cells: Vec<Option<f64>> = if let Some(a) = any.downcast_ref::<Float64Array>() {
        a.iter().collect()
    } else if let Some(a) = any.downcast_ref::<Float32Array>() {
        a.iter().map(|v| v.map(f64::from)).collect()
    } else if let Some(a) = any.downcast_ref::<Int64Array>() {
        a.iter().map(|v| v.map(|v| v as f64)).collect()
    } else if let Some(a) = any.downcast_ref::<Int32Array>() {
        a.iter().map(|v| v.map(f64::from)).collect()
    } else {
        return Err(DenseMatrixProviderError::InvalidControlType {
            column: column.to_owned(),
            actual: array.data_type().clone(),
        });
    };
    for (offset, cell) in cells.into_iter().enumerate() {
        let value = cell.ok_or_else(|| DenseMatrixProviderError::NullControl {
            column: column.to_owned(),
            row: start + offset,
        })?;
        out.push(value);
    }
    Ok(())
}
