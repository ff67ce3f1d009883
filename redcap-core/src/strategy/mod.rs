//! Spanning-tree construction strategies.
//!
//! Six variants cross the edge universe ([`EdgeOrder`]) with the cluster
//! distance rule ([`Linkage`]). Every variant shares one driving loop: pull
//! the next candidate edge, reject it if it would close a cycle or fails the
//! variant's acceptance test, otherwise add it to the tree and merge the two
//! clusters it joins. Construction stops as soon as the tree covers every
//! valid observation.

mod first_order;
mod full_order;

use std::{fmt, str::FromStr};

use tracing::{debug, instrument};

use crate::{
    cluster::{ClusterHandle, ClusterManager},
    distance::PairwiseDistances,
    error::{RedcapError, Result},
    graph::{GraphEdge, SpatialGraph},
    tree::SpanningTree,
};

/// Which edges drive agglomeration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EdgeOrder {
    /// Only edges between contiguous observations.
    FirstOrder,
    /// Edges between every pair of observations, with contiguity checked
    /// separately.
    FullOrder,
}

/// How the distance between two clusters is defined as they grow.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Linkage {
    /// Closest pair.
    Single,
    /// Weighted mean over pairs.
    Average,
    /// Farthest pair.
    Complete,
}

/// One of the six REDCAP tree-building variants.
///
/// # Examples
/// ```
/// use redcap_core::{EdgeOrder, Linkage, Strategy};
///
/// let strategy: Strategy = "full-order-complete".parse()?;
/// assert_eq!(strategy.edge_order(), EdgeOrder::FullOrder);
/// assert_eq!(strategy.linkage(), Linkage::Complete);
/// assert_eq!(strategy.to_string(), "full-order-complete");
/// # Ok::<(), redcap_core::ParseStrategyError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Strategy {
    /// First-order single linkage.
    #[default]
    FirstOrderSingle,
    /// First-order average linkage.
    FirstOrderAverage,
    /// First-order complete linkage.
    FirstOrderComplete,
    /// Full-order single linkage.
    FullOrderSingle,
    /// Full-order average linkage.
    FullOrderAverage,
    /// Full-order complete linkage.
    FullOrderComplete,
}

impl Strategy {
    /// Every variant, first-order first.
    pub const ALL: [Self; 6] = [
        Self::FirstOrderSingle,
        Self::FirstOrderAverage,
        Self::FirstOrderComplete,
        Self::FullOrderSingle,
        Self::FullOrderAverage,
        Self::FullOrderComplete,
    ];

    /// Combines an edge universe with a linkage rule.
    #[must_use]
    pub const fn new(order: EdgeOrder, linkage: Linkage) -> Self {
        match (order, linkage) {
            (EdgeOrder::FirstOrder, Linkage::Single) => Self::FirstOrderSingle,
            (EdgeOrder::FirstOrder, Linkage::Average) => Self::FirstOrderAverage,
            (EdgeOrder::FirstOrder, Linkage::Complete) => Self::FirstOrderComplete,
            (EdgeOrder::FullOrder, Linkage::Single) => Self::FullOrderSingle,
            (EdgeOrder::FullOrder, Linkage::Average) => Self::FullOrderAverage,
            (EdgeOrder::FullOrder, Linkage::Complete) => Self::FullOrderComplete,
        }
    }

    /// Edge universe of this variant.
    #[must_use]
    pub const fn edge_order(self) -> EdgeOrder {
        match self {
            Self::FirstOrderSingle | Self::FirstOrderAverage | Self::FirstOrderComplete => {
                EdgeOrder::FirstOrder
            }
            Self::FullOrderSingle | Self::FullOrderAverage | Self::FullOrderComplete => {
                EdgeOrder::FullOrder
            }
        }
    }

    /// Linkage rule of this variant.
    #[must_use]
    pub const fn linkage(self) -> Linkage {
        match self {
            Self::FirstOrderSingle | Self::FullOrderSingle => Linkage::Single,
            Self::FirstOrderAverage | Self::FullOrderAverage => Linkage::Average,
            Self::FirstOrderComplete | Self::FullOrderComplete => Linkage::Complete,
        }
    }

    /// Returns the kebab-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstOrderSingle => "first-order-single",
            Self::FirstOrderAverage => "first-order-average",
            Self::FirstOrderComplete => "first-order-complete",
            Self::FullOrderSingle => "full-order-single",
            Self::FullOrderAverage => "full-order-average",
            Self::FullOrderComplete => "full-order-complete",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown strategy `{0}`")]
pub struct ParseStrategyError(pub String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(value: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == value)
            .ok_or_else(|| ParseStrategyError(value.to_owned()))
    }
}

/// Builds a spanning tree over every valid observation of `graph`.
///
/// # Errors
/// Returns [`RedcapError::GraphNotConnected`] when the candidate edges are
/// exhausted before the tree covers every valid observation.
#[instrument(
    name = "core.build_tree",
    level = "debug",
    skip(graph, distances),
    fields(nodes = graph.nodes().len(), edges = graph.edges().len()),
)]
pub fn build_spanning_tree(
    strategy: Strategy,
    graph: &SpatialGraph,
    distances: &PairwiseDistances,
) -> Result<SpanningTree> {
    let mut builder = TreeBuilder::new(graph, distances);
    if !builder.tree.is_fully_covered() {
        match strategy {
            Strategy::FirstOrderSingle => first_order::single(&mut builder, graph),
            Strategy::FirstOrderAverage => first_order::average(&mut builder, graph),
            Strategy::FirstOrderComplete => first_order::complete(&mut builder, graph),
            Strategy::FullOrderSingle => full_order::single(&mut builder, graph),
            Strategy::FullOrderAverage => full_order::average(&mut builder, graph),
            Strategy::FullOrderComplete => full_order::complete(&mut builder, graph),
        }
    }
    builder.finish()
}

/// Mutable candidate edge; average linkage rewrites `length`.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    a: usize,
    b: usize,
    length: f64,
}

impl From<&GraphEdge> for Candidate {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            a: edge.a(),
            b: edge.b(),
            length: edge.length(),
        }
    }
}

fn candidates(edges: &[GraphEdge]) -> Vec<Candidate> {
    edges.iter().map(Candidate::from).collect()
}

fn sort_ascending(edges: &mut [Candidate]) {
    edges.sort_by(|left, right| left.length.total_cmp(&right.length));
}

/// Sorts longest first so that `pop` yields the shortest edge.
fn sort_for_popping(edges: &mut [Candidate]) {
    edges.sort_by(|left, right| right.length.total_cmp(&left.length));
}

/// State shared by every strategy while the tree grows.
struct TreeBuilder<'a> {
    tree: SpanningTree,
    clusters: ClusterManager,
    distances: &'a PairwiseDistances,
    expected: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(graph: &SpatialGraph, distances: &'a PairwiseDistances) -> Self {
        Self {
            tree: SpanningTree::covering(graph.nodes().iter().copied()),
            clusters: ClusterManager::new(graph.observations()),
            distances,
            expected: graph.nodes().len(),
        }
    }

    /// Adds `(a, b)` with its observed dissimilarity and reports whether the
    /// tree now covers every valid observation.
    fn add(&mut self, a: usize, b: usize) -> bool {
        self.tree.add_edge(a, b, self.distances.get(a, b));
        self.tree.is_fully_covered()
    }

    fn root(&self, cluster: ClusterHandle) -> usize {
        // Handles come from live lookups, so the cluster exists.
        self.clusters.root(cluster).unwrap_or_default()
    }

    /// Whether `edge` joins a member of `l` to a member of `m`.
    fn bridges(&self, edge: &Candidate, l: ClusterHandle, m: ClusterHandle) -> bool {
        let has = |cluster, id| self.clusters.has(cluster, id);
        (has(l, edge.a) && has(m, edge.b)) || (has(l, edge.b) && has(m, edge.a))
    }

    /// Sets the length of every remaining edge between clusters `c` and `l`.
    fn relabel(
        &self,
        work: &mut [Candidate],
        c: ClusterHandle,
        l: ClusterHandle,
        distance: f64,
    ) -> bool {
        let mut changed = false;
        for edge in work.iter_mut().filter(|edge| self.bridges(edge, c, l)) {
            edge.length = distance;
            changed = true;
        }
        changed
    }

    /// Live clusters other than `skip`, with their roots.
    fn others(&self, skip: ClusterHandle) -> Vec<(ClusterHandle, usize)> {
        self.clusters
            .live_clusters()
            .filter(|&cluster| cluster != skip)
            .map(|cluster| (cluster, self.root(cluster)))
            .collect()
    }

    fn finish(self) -> Result<SpanningTree> {
        if self.tree.is_fully_covered() {
            debug!(edges = self.tree.edges().len(), "spanning tree complete");
            return Ok(self.tree);
        }
        Err(RedcapError::GraphNotConnected {
            covered: self.tree.reached(),
            expected: self.expected,
        })
    }
}

/// Dense symmetric table keyed by cluster root observations.
struct PairTable<T> {
    size: usize,
    values: Vec<T>,
}

impl<T: Copy> PairTable<T> {
    fn filled(size: usize, value: T) -> Self {
        Self {
            size,
            values: vec![value; size * size],
        }
    }

    fn get(&self, i: usize, j: usize) -> T {
        self.values[i * self.size + j]
    }

    fn set(&mut self, i: usize, j: usize, value: T) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }
}

#[cfg(test)]
mod tests;
