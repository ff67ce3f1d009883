//! Contiguity graph over valid observations.
//!
//! Nodes are observation ids; every first-order edge joins two contiguous,
//! valid observations and carries their precomputed dissimilarity as its
//! length. Full-order variants additionally enumerate every unordered pair
//! of valid observations via [`SpatialGraph::full_order_edges`].

use std::collections::HashSet;

use tracing::instrument;

use crate::{
    contiguity::Contiguity,
    distance::PairwiseDistances,
    error::{RedcapError, Result},
};

/// An undirected edge between two observations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphEdge {
    a: usize,
    b: usize,
    length: f64,
    weight: Option<f64>,
}

impl GraphEdge {
    pub(crate) const fn new(a: usize, b: usize, length: f64, weight: Option<f64>) -> Self {
        Self {
            a,
            b,
            length,
            weight,
        }
    }

    /// Returns the first endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn a(&self) -> usize { self.a }

    /// Returns the second endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn b(&self) -> usize { self.b }

    /// Returns the dissimilarity between the endpoints.
    #[must_use]
    #[rustfmt::skip]
    pub fn length(&self) -> f64 { self.length }

    /// Returns the contiguity weight, if the model supplied one.
    #[must_use]
    #[rustfmt::skip]
    pub fn weight(&self) -> Option<f64> { self.weight }
}

/// First-order contiguity graph restricted to valid observations.
#[derive(Clone, Debug)]
pub struct SpatialGraph {
    observations: usize,
    nodes: Vec<usize>,
    edges: Vec<GraphEdge>,
    adjacency: HashSet<(usize, usize)>,
}

impl SpatialGraph {
    /// Builds the first-order graph.
    ///
    /// One node is created per valid observation and one edge per undirected
    /// neighbour pair; `(i, j)` and `(j, i)` collapse into the edge seen
    /// first. Self-loops and pairs touching an invalid observation are
    /// skipped.
    ///
    /// # Errors
    /// Returns [`RedcapError::ContiguityLengthMismatch`] or
    /// [`RedcapError::InvalidNeighbour`] when `contiguity` does not describe
    /// `mask.len()` observations, and [`RedcapError::DistanceMatrixSize`] when
    /// `distances` covers a different number of observations.
    #[instrument(
        name = "core.build_graph",
        level = "debug",
        skip_all,
        fields(observations = mask.len()),
    )]
    pub fn first_order(
        mask: &[bool],
        contiguity: &Contiguity,
        distances: &PairwiseDistances,
    ) -> Result<Self> {
        let observations = mask.len();
        contiguity.validate(observations)?;
        if distances.observations() != observations {
            return Err(RedcapError::DistanceMatrixSize {
                expected: observations * observations.saturating_sub(1) / 2,
                actual: distances.observations() * distances.observations().saturating_sub(1) / 2,
            });
        }

        let nodes: Vec<usize> = (0..observations).filter(|&i| mask[i]).collect();
        let mut edges = Vec::new();
        let mut adjacency = HashSet::new();
        for &i in &nodes {
            for (j, weight) in contiguity.neighbours(i) {
                if i == j || !mask[j] {
                    continue;
                }
                if adjacency.insert(key(i, j)) {
                    edges.push(GraphEdge::new(i, j, distances.get(i, j), weight));
                }
            }
        }

        Ok(Self {
            observations,
            nodes,
            edges,
            adjacency,
        })
    }

    /// Returns one edge per unordered pair of valid observations, with
    /// lengths read from `distances`.
    #[must_use]
    pub fn full_order_edges(&self, distances: &PairwiseDistances) -> Vec<GraphEdge> {
        let mut edges = Vec::with_capacity(self.nodes.len() * self.nodes.len().saturating_sub(1) / 2);
        for (position, &a) in self.nodes.iter().enumerate() {
            for &b in &self.nodes[position + 1..] {
                edges.push(GraphEdge::new(a, b, distances.get(a, b), None));
            }
        }
        edges
    }

    /// Returns whether `a` and `b` are directly contiguous.
    #[must_use]
    pub fn is_first_order(&self, a: usize, b: usize) -> bool {
        self.adjacency.contains(&key(a, b))
    }

    /// Total number of observations, valid or not.
    #[must_use]
    #[rustfmt::skip]
    pub fn observations(&self) -> usize { self.observations }

    /// Valid observation ids in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes(&self) -> &[usize] { &self.nodes }

    /// First-order edges in construction order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[GraphEdge] { &self.edges }
}

const fn key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
