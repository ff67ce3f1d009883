//! Builder for configuring [`Redcap`] runs.
//!
//! Collects the region count, tree-construction strategy, attribute metric,
//! split worker count and optional control constraint, validating them
//! before a [`Redcap`] instance is created.

use std::num::NonZeroUsize;

use crate::{
    Result, distance::DistanceMetric, error::RedcapError, redcap::Redcap, strategy::Strategy,
    tree::ControlConstraint,
};

/// Configures and constructs [`Redcap`] instances.
///
/// # Examples
/// ```
/// use redcap_core::{RedcapBuilder, Strategy};
///
/// let redcap = RedcapBuilder::new()
///     .with_region_count(4)
///     .with_strategy(Strategy::FullOrderComplete)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(redcap.region_count().get(), 4);
/// assert_eq!(redcap.strategy(), Strategy::FullOrderComplete);
/// ```
#[derive(Debug, Clone)]
pub struct RedcapBuilder {
    region_count: usize,
    strategy: Strategy,
    metric: DistanceMetric,
    workers: Option<NonZeroUsize>,
    control: Option<ControlConstraint>,
}

impl Default for RedcapBuilder {
    fn default() -> Self {
        Self {
            region_count: 2,
            strategy: Strategy::default(),
            metric: DistanceMetric::default(),
            workers: None,
            control: None,
        }
    }
}

impl RedcapBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use redcap_core::{DistanceMetric, RedcapBuilder, Strategy};
    ///
    /// let builder = RedcapBuilder::new();
    /// assert_eq!(builder.region_count(), 2);
    /// assert_eq!(builder.strategy(), Strategy::FirstOrderSingle);
    /// assert_eq!(builder.metric(), DistanceMetric::Euclidean);
    /// assert!(builder.workers().is_none());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the number of regions to produce.
    #[must_use]
    pub fn with_region_count(mut self, regions: usize) -> Self {
        self.region_count = regions;
        self
    }

    /// Returns the configured region count.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.region_count
    }

    /// Selects how the spanning tree is grown.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the configured strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Selects the metric used to compare attribute rows.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Returns the configured metric.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Sets the number of threads that evaluate candidate cuts.
    ///
    /// `None` uses the available parallelism of the host.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use redcap_core::RedcapBuilder;
    ///
    /// let builder = RedcapBuilder::new().with_workers(NonZeroUsize::new(3));
    /// assert_eq!(builder.workers().map(NonZeroUsize::get), Some(3));
    /// ```
    #[must_use]
    pub fn with_workers(mut self, workers: Option<NonZeroUsize>) -> Self {
        self.workers = workers;
        self
    }

    /// Returns the configured worker count, if any.
    #[must_use]
    pub fn workers(&self) -> Option<NonZeroUsize> {
        self.workers
    }

    /// Requires every region to exceed a minimum total of a control
    /// variable.
    ///
    /// # Examples
    /// ```
    /// use redcap_core::{ControlConstraint, RedcapBuilder};
    ///
    /// let control = ControlConstraint::new(vec![10.0, 20.0, 30.0], 25.0)?;
    /// let builder = RedcapBuilder::new().with_control(control);
    /// assert_eq!(builder.control().map(ControlConstraint::threshold), Some(25.0));
    /// # Ok::<(), redcap_core::RedcapError>(())
    /// ```
    #[must_use]
    pub fn with_control(mut self, control: ControlConstraint) -> Self {
        self.control = Some(control);
        self
    }

    /// Returns the configured control constraint, if any.
    #[must_use]
    pub fn control(&self) -> Option<&ControlConstraint> {
        self.control.as_ref()
    }

    /// Validates the configuration and constructs a [`Redcap`] instance.
    ///
    /// # Errors
    /// Returns [`RedcapError::InvalidRegionCount`] when the region count is
    /// zero.
    ///
    /// # Examples
    /// ```
    /// use redcap_core::{RedcapBuilder, RedcapErrorCode};
    ///
    /// let err = RedcapBuilder::new().with_region_count(0).build().unwrap_err();
    /// assert_eq!(err.code(), RedcapErrorCode::InvalidRegionCount);
    /// ```
    pub fn build(self) -> Result<Redcap> {
        let region_count = NonZeroUsize::new(self.region_count).ok_or(
            RedcapError::InvalidRegionCount {
                got: self.region_count,
            },
        )?;

        Ok(Redcap::new(
            region_count,
            self.strategy,
            self.metric,
            self.workers,
            self.control,
        ))
    }
}
