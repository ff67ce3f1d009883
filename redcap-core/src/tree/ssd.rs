//! Homogeneity scoring with memoisation.
//!
//! The score of a member set is its sum of squared deviations (SSD) from the
//! per-column mean. Sibling split attempts re-evaluate the same member sets
//! many times, so both means and scores are cached by the sorted member ids.
//! Caches are shared across split workers; each lock is held only for a
//! lookup or an insert, and concurrent recomputation of the same key writes
//! the same value.

use std::{
    borrow::Cow,
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    attributes::AttributeMatrix,
    datasource::DataSource,
    error::{ControlPosition, RedcapError, Result},
};

/// Minimum aggregate of a per-observation control value.
///
/// A member set satisfies the constraint only when the sum of its control
/// values is strictly greater than the threshold (for example a minimum
/// population per region).
///
/// # Examples
/// ```
/// use redcap_core::ControlConstraint;
///
/// let control = ControlConstraint::new(vec![10.0, 20.0, 5.0], 25.0)?;
/// assert!(control.admits(&[0, 1]));
/// assert!(!control.admits(&[1, 2]));
/// # Ok::<(), redcap_core::RedcapError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ControlConstraint {
    values: Vec<f64>,
    threshold: f64,
}

impl ControlConstraint {
    /// Creates a constraint from one value per observation and a threshold.
    ///
    /// # Errors
    /// Returns [`RedcapError::NonFiniteControl`] when the threshold or any
    /// value is NaN or infinite.
    pub fn new(values: Vec<f64>, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(RedcapError::NonFiniteControl {
                position: ControlPosition::Threshold,
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(RedcapError::NonFiniteControl {
                position: ControlPosition::Observation(index),
            });
        }
        Ok(Self { values, threshold })
    }

    /// Per-observation control values.
    #[must_use]
    #[rustfmt::skip]
    pub fn values(&self) -> &[f64] { &self.values }

    /// Exclusive lower bound on a member set's total.
    #[must_use]
    #[rustfmt::skip]
    pub fn threshold(&self) -> f64 { self.threshold }

    /// Returns whether the summed control value of `ids` exceeds the
    /// threshold. Ids without a value count as zero.
    #[must_use]
    pub fn admits(&self, ids: &[usize]) -> bool {
        let total: f64 = ids.iter().filter_map(|&id| self.values.get(id)).sum();
        total > self.threshold
    }

    pub(crate) fn check_len(&self, observations: usize) -> Result<()> {
        if self.values.len() == observations {
            Ok(())
        } else {
            Err(RedcapError::ControlLengthMismatch {
                expected: observations,
                actual: self.values.len(),
            })
        }
    }
}

type MemberKey = Box<[usize]>;

/// Scores member sets against an attribute matrix and an optional control
/// constraint.
#[derive(Debug)]
pub struct SsdEvaluator<'a> {
    matrix: &'a AttributeMatrix,
    control: Option<&'a ControlConstraint>,
    means: Mutex<HashMap<MemberKey, Arc<[f64]>>>,
    scores: Mutex<HashMap<MemberKey, f64>>,
}

impl<'a> SsdEvaluator<'a> {
    /// Creates an evaluator with empty caches.
    #[must_use]
    pub fn new(matrix: &'a AttributeMatrix, control: Option<&'a ControlConstraint>) -> Self {
        Self {
            matrix,
            control,
            means: Mutex::new(HashMap::new()),
            scores: Mutex::new(HashMap::new()),
        }
    }

    /// Scores `ids`, returning `None` when the set cannot form a region: it
    /// has at most one member or fails the control constraint. A set of
    /// identical observations scores `Some(0.0)`.
    ///
    /// # Errors
    /// Returns [`RedcapError::LockPoisoned`] if a cache lock was poisoned by
    /// a panicking worker.
    pub fn evaluate(&self, ids: &[usize]) -> Result<Option<f64>> {
        if ids.len() <= 1 {
            return Ok(None);
        }
        let ids = sorted(ids);
        if let Some(&score) = lock(&self.scores, "ssd cache")?.get(ids.as_ref()) {
            return Ok(Some(score));
        }
        if self.control.is_some_and(|control| !control.admits(&ids)) {
            return Ok(None);
        }

        let score = self.sum_of_squares(&ids)?;
        lock(&self.scores, "ssd cache")?.insert(ids.into_owned().into_boxed_slice(), score);
        Ok(Some(score))
    }

    /// Scores `ids` the classical way: zero for sets of at most one member or
    /// sets rejected by the control constraint.
    ///
    /// # Errors
    /// See [`SsdEvaluator::evaluate`].
    pub fn compute_ssd(&self, ids: &[usize]) -> Result<f64> {
        Ok(self.evaluate(ids)?.unwrap_or(0.0))
    }

    /// Sum of squared deviations of `ids` ignoring the control constraint.
    ///
    /// # Errors
    /// See [`SsdEvaluator::evaluate`].
    pub fn unconstrained_ssd(&self, ids: &[usize]) -> Result<f64> {
        if ids.len() <= 1 {
            return Ok(0.0);
        }
        self.sum_of_squares(&sorted(ids))
    }

    fn sum_of_squares(&self, ids: &[usize]) -> Result<f64> {
        let mean = self.mean(ids)?;
        let mut total = 0.0;
        for (column, &centre) in mean.iter().enumerate() {
            total += ids
                .iter()
                .map(|&id| {
                    let delta = self.matrix.value(id, column) - centre;
                    delta * delta
                })
                .sum::<f64>();
        }
        Ok(total)
    }

    fn mean(&self, ids: &[usize]) -> Result<Arc<[f64]>> {
        if let Some(mean) = lock(&self.means, "mean cache")?.get(ids) {
            return Ok(Arc::clone(mean));
        }
        let count = ids.len() as f64;
        let mean: Arc<[f64]> = (0..self.matrix.dimension())
            .map(|column| ids.iter().map(|&id| self.matrix.value(id, column)).sum::<f64>() / count)
            .collect();
        lock(&self.means, "mean cache")?.insert(ids.into(), Arc::clone(&mean));
        Ok(mean)
    }
}

fn sorted(ids: &[usize]) -> Cow<'_, [usize]> {
    if ids.is_sorted() {
        Cow::Borrowed(ids)
    } else {
        let mut owned = ids.to_vec();
        owned.sort_unstable();
        Cow::Owned(owned)
    }
}

fn lock<'m, T>(
    mutex: &'m Mutex<T>,
    resource: &'static str,
) -> Result<std::sync::MutexGuard<'m, T>> {
    mutex
        .lock()
        .map_err(|_| RedcapError::LockPoisoned { resource })
}
