//! Data source abstractions for the REDCAP engine.

use crate::error::DataSourceError;

/// Abstraction over a table of observations with numeric clustering
/// attributes.
///
/// Observations are addressed by their row index. Rows flagged invalid via
/// [`DataSource::is_valid`] are excluded from every graph and homogeneity
/// computation; their attributes are never read.
///
/// # Examples
/// ```
/// use redcap_core::{DataSource, DataSourceError};
///
/// struct Dummy(Vec<f64>);
///
/// impl DataSource for Dummy {
///     fn len(&self) -> usize { self.0.len() }
///     fn name(&self) -> &str { "dummy" }
///     fn dimension(&self) -> usize { 1 }
///     fn attributes(&self, index: usize) -> Result<&[f64], DataSourceError> {
///         self.0
///             .get(index)
///             .map(std::slice::from_ref)
///             .ok_or(DataSourceError::OutOfBounds { index })
///     }
/// }
///
/// let src = Dummy(vec![1.0, 2.0, 4.0]);
/// assert_eq!(src.len(), 3);
/// assert_eq!(src.attributes(2)?, &[4.0]);
/// assert!(src.is_valid(0));
/// # Ok::<(), DataSourceError>(())
/// ```
pub trait DataSource {
    /// Returns the number of observations, including invalid ones.
    fn len(&self) -> usize;

    /// Returns whether the source contains no observations.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name.
    fn name(&self) -> &str;

    /// Returns the number of attribute columns per observation.
    fn dimension(&self) -> usize;

    /// Returns the attribute row for `index`.
    ///
    /// # Errors
    /// Implementations must return [`DataSourceError::OutOfBounds`] for
    /// indices at or beyond [`DataSource::len`].
    fn attributes(&self, index: usize) -> Result<&[f64], DataSourceError>;

    /// Returns whether the observation participates in regionalization.
    ///
    /// The default treats every observation as valid.
    fn is_valid(&self, index: usize) -> bool {
        index < self.len()
    }
}
