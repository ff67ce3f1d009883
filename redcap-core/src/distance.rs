//! Dissimilarity between observations.
//!
//! Edge lengths in every REDCAP graph are read from a [`PairwiseDistances`]
//! table. The table is either computed from attribute rows with a
//! [`DistanceMetric`] or supplied directly by the caller.

use std::{fmt, str::FromStr};

use rayon::prelude::*;

use crate::{
    attributes::AttributeMatrix,
    datasource::DataSource,
    error::{RedcapError, Result},
};

/// Metric used to derive pairwise dissimilarity from attribute rows.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DistanceMetric {
    /// Square root of the summed squared column differences.
    #[default]
    Euclidean,
    /// Sum of absolute column differences.
    Manhattan,
}

impl DistanceMetric {
    /// Returns the kebab-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
        }
    }

    /// Computes the distance between two equally sized rows.
    ///
    /// # Examples
    /// ```
    /// use redcap_core::DistanceMetric;
    ///
    /// let d = DistanceMetric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
    /// assert!((d - 5.0).abs() < 1e-12);
    /// assert_eq!(DistanceMetric::Manhattan.distance(&[0.0, 0.0], &[3.0, 4.0]), 7.0);
    /// ```
    #[must_use]
    pub fn distance(self, left: &[f64], right: &[f64]) -> f64 {
        let pairs = left.iter().zip(right);
        match self {
            Self::Euclidean => pairs
                .map(|(l, r)| {
                    let diff = l - r;
                    diff * diff
                })
                .sum::<f64>()
                .sqrt(),
            Self::Manhattan => pairs.map(|(l, r)| (l - r).abs()).sum(),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown distance metric `{0}` (expected `euclidean` or `manhattan`)")]
pub struct ParseMetricError(pub String);

impl FromStr for DistanceMetric {
    type Err = ParseMetricError;

    fn from_str(value: &str) -> core::result::Result<Self, Self::Err> {
        match value {
            "euclidean" => Ok(Self::Euclidean),
            "manhattan" => Ok(Self::Manhattan),
            other => Err(ParseMetricError(other.to_owned())),
        }
    }
}

/// Symmetric dissimilarity table stored in condensed (upper-triangle) form.
///
/// Entries involving an invalid observation are stored as zero and are never
/// read by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct PairwiseDistances {
    observations: usize,
    condensed: Vec<f64>,
}

impl PairwiseDistances {
    /// Computes every pairwise distance between valid observations in
    /// parallel.
    ///
    /// # Errors
    /// Returns [`RedcapError::NonFiniteDistance`] when a distance overflows.
    pub fn compute(matrix: &AttributeMatrix, metric: DistanceMetric) -> Result<Self> {
        let observations = matrix.len();
        let mask = matrix.mask();
        let rows: Vec<Vec<f64>> = (0..observations)
            .into_par_iter()
            .map(|left| {
                let mut row = Vec::with_capacity(observations - left - 1);
                for right in (left + 1)..observations {
                    if !(mask[left] && mask[right]) {
                        row.push(0.0);
                        continue;
                    }
                    let d = metric.distance(row_of(matrix, left), row_of(matrix, right));
                    if !d.is_finite() {
                        return Err(RedcapError::NonFiniteDistance { left, right });
                    }
                    row.push(d);
                }
                Ok(row)
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            observations,
            condensed: rows.into_iter().flatten().collect(),
        })
    }

    /// Builds a table by calling `distance` once for every unordered pair.
    ///
    /// # Errors
    /// Returns [`RedcapError::NonFiniteDistance`] when `distance` yields NaN
    /// or an infinity.
    pub fn from_fn<F>(observations: usize, mut distance: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut condensed = Vec::with_capacity(condensed_len(observations));
        for left in 0..observations {
            for right in (left + 1)..observations {
                let d = distance(left, right);
                if !d.is_finite() {
                    return Err(RedcapError::NonFiniteDistance { left, right });
                }
                condensed.push(d);
            }
        }
        Ok(Self {
            observations,
            condensed,
        })
    }

    /// Wraps an existing condensed upper-triangle vector, row by row
    /// (`(0,1), (0,2), .., (1,2), ..`).
    ///
    /// # Errors
    /// Returns [`RedcapError::DistanceMatrixSize`] when `condensed` does not
    /// hold `n * (n - 1) / 2` values and
    /// [`RedcapError::NonFiniteDistance`] for NaN or infinite entries.
    pub fn from_condensed(observations: usize, condensed: Vec<f64>) -> Result<Self> {
        let expected = condensed_len(observations);
        if condensed.len() != expected {
            return Err(RedcapError::DistanceMatrixSize {
                expected,
                actual: condensed.len(),
            });
        }
        let table = Self {
            observations,
            condensed,
        };
        for left in 0..observations {
            for right in (left + 1)..observations {
                if !table.get(left, right).is_finite() {
                    return Err(RedcapError::NonFiniteDistance { left, right });
                }
            }
        }
        Ok(table)
    }

    /// Number of observations covered by the table.
    #[must_use]
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Returns the distance between `left` and `right`; zero on the diagonal.
    ///
    /// # Panics
    /// Panics when either index is not below [`Self::observations`].
    #[must_use]
    pub fn get(&self, left: usize, right: usize) -> f64 {
        assert!(
            left < self.observations && right < self.observations,
            "distance index out of range"
        );
        match left.cmp(&right) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.condensed[self.index(left, right)],
            std::cmp::Ordering::Greater => self.condensed[self.index(right, left)],
        }
    }

    fn index(&self, low: usize, high: usize) -> usize {
        low * self.observations - low * (low + 1) / 2 + (high - low - 1)
    }
}

fn condensed_len(observations: usize) -> usize {
    observations * observations.saturating_sub(1) / 2
}

fn row_of(matrix: &AttributeMatrix, index: usize) -> &[f64] {
    // Indices come from `0..matrix.len()`.
    matrix.attributes(index).unwrap_or(&[])
}
