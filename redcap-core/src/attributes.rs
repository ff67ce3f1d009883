//! Dense attribute storage used by the engine.
//!
//! [`AttributeMatrix`] snapshots a [`DataSource`] into a contiguous
//! row-major buffer together with its validity mask, so homogeneity scoring
//! can read rows without going back through the trait object.

use crate::{datasource::DataSource, error::DataSourceError};

/// Row-major matrix of observation attributes plus a validity mask.
///
/// # Examples
/// ```
/// use redcap_core::{AttributeMatrix, DataSource};
///
/// let matrix = AttributeMatrix::try_from_rows("demo", vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
/// assert_eq!(matrix.len(), 2);
/// assert_eq!(matrix.dimension(), 2);
/// assert_eq!(matrix.attributes(1)?, &[3.0, 4.0]);
/// # Ok::<(), redcap_core::DataSourceError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeMatrix {
    name: String,
    rows: usize,
    dimension: usize,
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl AttributeMatrix {
    /// Builds a matrix where every observation is valid.
    ///
    /// # Errors
    /// Returns [`DataSourceError::EmptyData`] when `rows` is empty,
    /// [`DataSourceError::ZeroDimension`] when the first row is empty,
    /// [`DataSourceError::DimensionMismatch`] when rows differ in length and
    /// [`DataSourceError::NonFinite`] when a value is NaN or infinite.
    pub fn try_from_rows(
        name: impl Into<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, DataSourceError> {
        let valid = vec![true; rows.len()];
        Self::try_from_rows_with_mask(name, rows, valid)
    }

    /// Builds a matrix with an explicit validity mask.
    ///
    /// Rows flagged invalid are stored as zeros and may contain any values,
    /// including non-finite ones. A mask shorter or longer than `rows` is a
    /// [`DataSourceError::DimensionMismatch`].
    ///
    /// # Errors
    /// See [`AttributeMatrix::try_from_rows`].
    pub fn try_from_rows_with_mask(
        name: impl Into<String>,
        rows: Vec<Vec<f64>>,
        valid: Vec<bool>,
    ) -> Result<Self, DataSourceError> {
        if rows.len() != valid.len() {
            return Err(DataSourceError::DimensionMismatch {
                left: rows.len(),
                right: valid.len(),
            });
        }
        let dimension = rows
            .first()
            .map(Vec::len)
            .ok_or(DataSourceError::EmptyData)?;
        if dimension == 0 {
            return Err(DataSourceError::ZeroDimension);
        }

        let mut values = Vec::with_capacity(rows.len().saturating_mul(dimension));
        for (index, (row, &is_valid)) in rows.iter().zip(&valid).enumerate() {
            if row.len() != dimension {
                return Err(DataSourceError::DimensionMismatch {
                    left: dimension,
                    right: row.len(),
                });
            }
            if is_valid {
                if let Some(column) = row.iter().position(|value| !value.is_finite()) {
                    return Err(DataSourceError::NonFinite { index, column });
                }
                values.extend_from_slice(row);
            } else {
                values.extend(std::iter::repeat_n(0.0, dimension));
            }
        }

        Ok(Self {
            name: name.into(),
            rows: rows.len(),
            dimension,
            values,
            valid,
        })
    }

    /// Copies every row of `source` into a new matrix.
    ///
    /// # Errors
    /// Propagates [`DataSourceError`] from the source and applies the same
    /// validation as [`AttributeMatrix::try_from_rows_with_mask`].
    pub fn from_source<D: DataSource + ?Sized>(source: &D) -> Result<Self, DataSourceError> {
        let len = source.len();
        if len == 0 {
            return Err(DataSourceError::EmptyData);
        }
        let dimension = source.dimension();
        if dimension == 0 {
            return Err(DataSourceError::ZeroDimension);
        }

        let mut rows = Vec::with_capacity(len);
        let mut valid = Vec::with_capacity(len);
        for index in 0..len {
            let is_valid = source.is_valid(index);
            let row = if is_valid {
                source.attributes(index)?.to_vec()
            } else {
                vec![0.0; dimension]
            };
            rows.push(row);
            valid.push(is_valid);
        }
        Self::try_from_rows_with_mask(source.name().to_owned(), rows, valid)
    }

    /// Returns the validity mask, one flag per observation.
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.valid
    }

    /// Returns the indices of valid observations in ascending order.
    #[must_use]
    pub fn valid_indices(&self) -> Vec<usize> {
        self.valid
            .iter()
            .enumerate()
            .filter_map(|(index, &is_valid)| is_valid.then_some(index))
            .collect()
    }

    /// Returns the attribute value at (`row`, `column`) without bounds
    /// reporting; callers index only rows they obtained from this matrix.
    pub(crate) fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.dimension + column]
    }

    fn row_slice(&self, index: usize) -> Result<&[f64], DataSourceError> {
        if index >= self.rows {
            return Err(DataSourceError::OutOfBounds { index });
        }
        let start = index * self.dimension;
        Ok(&self.values[start..start + self.dimension])
    }
}

impl DataSource for AttributeMatrix {
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
