//! Helpers for ingesting fixed-size list arrays into dense buffers.
use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, Float64Array};
use arrow_schema::{DataType, Field};

use crate::errors::DenseMatrixProviderError;

pub(crate) fn validate_fixed_size_list_field(
    field: &Field,
    column: &str,
) -> Result<usize, DenseMatrixProviderError> {
    match field.data_type() {
        DataType::FixedSizeList(child, width) => {
            check_value_type(child.data_type())?;
            usize::try_from(*width)
                .map_err(|_| DenseMatrixProviderError::InvalidDimension { actual: *width })
        }
        other => Err(DenseMatrixProviderError::InvalidColumnType {
            column: column.to_owned(),
            actual: other.clone(),
        }),
    }
}

fn check_value_type(value_type: &DataType) -> Result<(), DenseMatrixProviderError> {
    match value_type {
        DataType::Float32 | DataType::Float64 => Ok(()),
        other => Err(DenseMatrixProviderError::InvalidListValueType {
            actual: other.clone(),
        }),
    }
}

/// Row-major values plus one validity flag per row.
#[derive(Debug, Default)]
pub(crate) struct DenseBuffer {
    pub(crate) values: Vec<f64>,
    pub(crate) valid: Vec<bool>,
}

impl DenseBuffer {
    pub(crate) fn rows(&self) -> usize {
        self.valid.len()
    }

    /// Appends every row of `array`, returning its dimension.
    pub(crate) fn append(
        &mut self,
        array: &FixedSizeListArray,
        expected_dimension: Option<usize>,
    ) -> Result<usize, DenseMatrixProviderError> {
        let dimension = validate_fixed_size_list(array)?;
        if let Some(expected) = expected_dimension.filter(|&expected| expected != dimension) {
            return Err(DenseMatrixProviderError::InconsistentBatchDimension {
                expected,
                actual: dimension,
            });
        }
        self.copy_list_values(array, dimension)?;
        Ok(dimension)
    }

    /// Null rows and rows holding a NaN or infinite value are stored as
    /// zeros and flagged invalid. A null inside a non-null row is an error.
    pub(crate) fn copy_list_values(
        &mut self,
        array: &FixedSizeListArray,
        dimension: usize,
    ) -> Result<(), DenseMatrixProviderError> {
        let rows = array.len();
        let additional = rows
            .checked_mul(dimension)
            .ok_or(DenseMatrixProviderError::CapacityOverflow { rows, dimension })?;
        self.values.reserve(additional);
        self.valid.reserve(rows);
        for row_index in 0..rows {
            let absolute_row = self.rows();
            if array.is_null(row_index) {
                self.push_invalid(dimension);
                continue;
            }
            let row = row_values(&array.value(row_index), absolute_row)?;
            if row.len() != dimension {
                return Err(DenseMatrixProviderError::InvalidRowLength {
                    row: absolute_row,
                    expected: dimension,
                    actual: row.len(),
                });
            }
            if row.iter().any(|value| !value.is_finite()) {
                self.push_invalid(dimension);
                continue;
            }
            self.values.extend_from_slice(&row);
            self.valid.push(true);
        }
        Ok(())
    }

    fn push_invalid(&mut self, dimension: usize) {
        self.values.resize(self.values.len() + dimension, 0.0);
        self.valid.push(false);
    }
}

pub(crate) fn validate_fixed_size_list(
    array: &FixedSizeListArray,
) -> Result<usize, DenseMatrixProviderError> {
    check_value_type(&array.value_type())?;
    usize::try_from(array.value_length()).map_err(|_| DenseMatrixProviderError::InvalidDimension {
        actual: array.value_length(),
    })
}

fn row_values(row: &ArrayRef, row_index: usize) -> Result<Vec<f64>, DenseMatrixProviderError> {
    if let Some(floats) = row.as_any().downcast_ref::<Float64Array>() {
        collect_row(floats.iter(), row_index)
    } else if let Some(floats) = row.as_any().downcast_ref::<Float32Array>() {
        collect_row(floats.iter().map(|value| value.map(f64::from)), row_index)
    } else {
        Err(DenseMatrixProviderError::InvalidListValueType {
            actual: row.data_type().clone(),
        })
    }
}

fn collect_row(
    values: impl Iterator<Item = Option<f64>>,
    row: usize,
) -> Result<Vec<f64>, DenseMatrixProviderError> {
    values
        .enumerate()
        .map(|(value_index, value)| {
            value.ok_or(DenseMatrixProviderError::NullValue { row, value_index })
        })
        .collect()
}
