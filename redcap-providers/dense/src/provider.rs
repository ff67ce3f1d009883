//! Dense matrix provider implementation and ingestion utilities.
use std::{fs::File, path::Path};

use arrow_array::{Array, FixedSizeListArray, RecordBatchReader};

use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::file::reader::ChunkReader;
use redcap_core::{DataSource, DataSourceError};
use tracing::{debug, instrument};

use crate::errors::DenseMatrixProviderError;
use crate::ingest::{DenseBuffer, validate_fixed_size_list_field};

/// Attribute provider backed by a contiguous row-major `f64` buffer.
///
/// Rows that were null or held NaN or infinite values in the input are kept
/// so observation ids line up with the input, but report
/// [`DataSource::is_valid`] as `false`.
#[derive(Debug)]
pub struct DenseMatrixProvider {
    name: String,
    rows: usize,
    dimension: usize,
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl DenseMatrixProvider {
    pub(crate) fn from_buffer(
        name: impl Into<String>,
        dimension: usize,
        buffer: DenseBuffer,
    ) -> Self {
        debug_assert_eq!(
            buffer.values.len(),
            buffer.rows().saturating_mul(dimension)
        );
        Self {
            name: name.into(),
            rows: buffer.rows(),
            dimension,
            values: buffer.values,
            valid: buffer.valid,
        }
    }

    /// Returns the underlying row-major matrix. Invalid rows hold zeros.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.values
    }

    /// Returns the validity flag of every row.
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.valid
    }

    /// Number of rows flagged invalid.
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.valid.iter().filter(|&&valid| !valid).count()
    }

    /// Loads data from an Arrow [`FixedSizeListArray`].
    ///
    /// # Errors
    /// Returns [`DenseMatrixProviderError`] when the list does not hold
    /// floating-point values or a non-null row contains a null value.
    pub fn try_from_fixed_size_list(
        name: impl Into<String>,
        array: &FixedSizeListArray,
    ) -> Result<Self, DenseMatrixProviderError> {
        let mut buffer = DenseBuffer::default();
        let dimension = buffer.append(array, None)?;
        Ok(Self::from_buffer(name, dimension, buffer))
    }

    /// Loads data from a Parquet column containing
    /// `FixedSizeList<Float32 | Float64, D>` rows.
    ///
    /// # Errors
    /// Returns [`DenseMatrixProviderError::Io`] when the file cannot be
    /// opened, plus every error of
    /// [`DenseMatrixProvider::try_from_parquet_reader`].
    pub fn try_from_parquet_path(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        column: &str,
    ) -> Result<Self, DenseMatrixProviderError> {
        let file = File::open(path)?;
        Self::try_from_parquet_reader(name, file, column)
    }

    /// Loads data from a Parquet reader.
    ///
    /// # Errors
    /// Returns [`DenseMatrixProviderError::ColumnNotFound`] for an unknown
    /// column, a type error when the column is not a floating-point
    /// fixed-size list and Parquet or Arrow errors from decoding.
    #[instrument(name = "providers.dense.load", skip(name, reader), err)]
    pub fn try_from_parquet_reader<R>(
        name: impl Into<String>,
        reader: R,
        column: &str,
    ) -> Result<Self, DenseMatrixProviderError>
    where
        R: ChunkReader + Send + 'static,
    {
        let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
        let mask = ProjectionMask::columns(builder.parquet_schema(), [column]);
        let reader = builder.with_projection(mask).build()?;
        let schema = reader.schema();
        let column_index =
            schema
                .index_of(column)
                .map_err(|_| DenseMatrixProviderError::ColumnNotFound {
                    column: column.to_owned(),
                })?;
        let field = schema.field(column_index);
        let dimension = validate_fixed_size_list_field(field, column)?;
        let mut buffer = DenseBuffer::default();
        for batch in reader {
            let batch = batch?;
            let column_array = batch.column(column_index);
            let list = column_array
                .as_any()
                .downcast_ref::<FixedSizeListArray>()
                .ok_or_else(|| DenseMatrixProviderError::InvalidColumnType {
                    column: column.to_owned(),
                    actual: column_array.data_type().clone(),
                })?;
            buffer.append(list, Some(dimension))?;
        }
        let provider = Self::from_buffer(name, dimension, buffer);
        debug!(
            rows = provider.rows,
            dimension,
            invalid = provider.invalid_count(),
            "loaded attribute matrix"
        );
        Ok(provider)
    }

    fn row_slice(&self, index: usize) -> Result<&[f64], DataSourceError> {
        if index >= self.rows {
            return Err(DataSourceError::OutOfBounds { index });
        }
        let start = index
            .checked_mul(self.dimension)
            .ok_or(DataSourceError::OutOfBounds { index })?;
        let end = start
            .checked_add(self.dimension)
            .ok_or(DataSourceError::OutOfBounds { index })?;
        self.values
            .get(start..end)
            .ok_or(DataSourceError::OutOfBounds { index })
    }
}

impl DataSource for DenseMatrixProvider {
    fn len(&self) -> usize {
        self.rows
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn attributes(&self, index: usize) -> Result<&[f64], DataSourceError> {
        self.row_slice(index)
    }

    fn is_valid(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }
}
