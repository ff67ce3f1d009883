//! Regionalization orchestration.
//!
//! Provides the [`Redcap`] runtime entry point which validates its inputs,
//! builds the contiguity graph and spanning tree, and partitions the tree
//! into regions.

use std::{num::NonZeroUsize, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    Result,
    attributes::AttributeMatrix,
    contiguity::Contiguity,
    datasource::DataSource,
    distance::{DistanceMetric, PairwiseDistances},
    error::RedcapError,
    graph::SpatialGraph,
    partition::partition,
    quality::RegionQuality,
    result::Regionalization,
    strategy::{Strategy, build_spanning_tree},
    tree::{ControlConstraint, SplitWorkers, SsdEvaluator},
};

/// Entry point for running a regionalization.
///
/// # Examples
/// ```
/// use redcap_core::{AttributeMatrix, Contiguity, RedcapBuilder};
///
/// // 0 - 1 - 2 - 3 in a line
/// let source = AttributeMatrix::try_from_rows(
///     "line",
///     vec![vec![1.0], vec![2.0], vec![10.0], vec![11.0]],
/// )?;
/// let contiguity = Contiguity::from_neighbours(vec![vec![1], vec![0, 2], vec![1, 3], vec![2]]);
/// let redcap = RedcapBuilder::new().with_region_count(2).build()?;
/// let result = redcap.run(&source, &contiguity)?;
/// assert_eq!(result.region_count(), 2);
/// assert_eq!(result.regions()[0].members(), &[0, 1]);
/// assert_eq!(result.regions()[1].members(), &[2, 3]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Redcap {
    region_count: NonZeroUsize,
    strategy: Strategy,
    metric: DistanceMetric,
    workers: Option<NonZeroUsize>,
    control: Option<ControlConstraint>,
}

impl Redcap {
    pub(crate) fn new(
        region_count: NonZeroUsize,
        strategy: Strategy,
        metric: DistanceMetric,
        workers: Option<NonZeroUsize>,
        control: Option<ControlConstraint>,
    ) -> Self {
        Self {
            region_count,
            strategy,
            metric,
            workers,
            control,
        }
    }

    /// Returns the number of regions requested.
    #[must_use]
    pub fn region_count(&self) -> NonZeroUsize {
        self.region_count
    }

    /// Returns the tree-construction strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the metric used when distances are derived from attributes.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Returns the explicit split worker count, if one was configured.
    #[must_use]
    pub fn workers(&self) -> Option<NonZeroUsize> {
        self.workers
    }

    /// Returns the control constraint, if one was configured.
    #[must_use]
    pub fn control(&self) -> Option<&ControlConstraint> {
        self.control.as_ref()
    }

    /// Regionalizes `source` using `contiguity` as the spatial neighbour
    /// model and distances derived with the configured metric.
    ///
    /// # Errors
    /// Returns [`RedcapError::EmptySource`] when the source has no rows,
    /// [`RedcapError::NoValidObservations`] when every row is flagged
    /// invalid, [`RedcapError::DataSource`] when reading attributes fails,
    /// [`RedcapError::ContiguityLengthMismatch`],
    /// [`RedcapError::InvalidNeighbour`] or
    /// [`RedcapError::ControlLengthMismatch`] when the inputs disagree on the
    /// observation count, and [`RedcapError::GraphNotConnected`] when the
    /// contiguity graph cannot connect every valid observation.
    pub fn run<D: DataSource + ?Sized>(
        &self,
        source: &D,
        contiguity: &Contiguity,
    ) -> Result<Regionalization> {
        self.run_inner(source, contiguity, None)
    }

    /// Regionalizes `source` with caller-supplied pairwise distances.
    ///
    /// The configured metric is ignored; attributes are still read to score
    /// region homogeneity.
    ///
    /// # Errors
    /// As for [`Redcap::run`], plus [`RedcapError::DistanceMatrixSize`] when
    /// `distances` covers a different number of observations.
    pub fn run_with_distances<D: DataSource + ?Sized>(
        &self,
        source: &D,
        contiguity: &Contiguity,
        distances: &PairwiseDistances,
    ) -> Result<Regionalization> {
        self.run_inner(source, contiguity, Some(distances))
    }

    #[instrument(
        name = "core.run",
        err,
        skip(self, source, contiguity, distances),
        fields(
            data_source = %source.name(),
            observations = source.len(),
            regions = self.region_count.get(),
            strategy = %self.strategy,
        ),
    )]
    fn run_inner<D: DataSource + ?Sized>(
        &self,
        source: &D,
        contiguity: &Contiguity,
        distances: Option<&PairwiseDistances>,
    ) -> Result<Regionalization> {
        if source.is_empty() {
            warn!(
                data_source = source.name(),
                "data source is empty, returning error"
            );
            return Err(RedcapError::EmptySource {
                data_source: Arc::from(source.name()),
            });
        }
        let matrix =
            AttributeMatrix::from_source(source).map_err(|error| RedcapError::DataSource {
                data_source: Arc::from(source.name()),
                error,
            })?;
        let valid = matrix.valid_indices();
        if valid.is_empty() {
            return Err(RedcapError::NoValidObservations {
                data_source: Arc::from(source.name()),
            });
        }
        let observations = matrix.len();
        contiguity.validate(observations)?;
        if let Some(control) = &self.control {
            control.check_len(observations)?;
        }
        let workers = SplitWorkers::new(self.workers)?;

        let computed;
        let distances = match distances {
            Some(distances) => distances,
            None => {
                computed = PairwiseDistances::compute(&matrix, self.metric)?;
                &computed
            }
        };

        let graph = SpatialGraph::first_order(matrix.mask(), contiguity, distances)?;
        let tree = build_spanning_tree(self.strategy, &graph, distances)?;
        let spanning_tree = tree.edges().to_vec();

        let evaluator = SsdEvaluator::new(&matrix, self.control.as_ref());
        let trees = partition(tree, self.region_count.get(), &evaluator, &workers)?;

        let mut groups = Vec::with_capacity(trees.len());
        for tree in &trees {
            let members = tree.member_ids();
            let ssd = evaluator.unconstrained_ssd(&members)?;
            groups.push((members, ssd));
        }
        let quality = RegionQuality::measure(
            &evaluator,
            &valid,
            groups.iter().map(|(members, _)| members.as_slice()),
        )?;

        if groups.len() < self.region_count.get() {
            warn!(
                requested = self.region_count.get(),
                produced = groups.len(),
                "constraints allowed fewer regions than requested"
            );
        }
        let result = Regionalization::assemble(
            self.strategy,
            self.region_count.get(),
            observations,
            groups,
            spanning_tree,
            quality,
        );
        info!(
            regions = result.region_count(),
            workers = workers.workers(),
            between_ratio = quality.ratio(),
            "regionalization completed"
        );
        Ok(result)
    }
}
