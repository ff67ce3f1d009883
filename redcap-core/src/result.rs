//! Result types for regionalization runs.

use std::io::{self, Write};

use crate::{
    edge_list::write_edge_list, quality::RegionQuality, strategy::Strategy, tree::TreeEdge,
};

/// Identifier assigned to a region.
///
/// Ids are contiguous from zero; region `0` is the largest.
///
/// # Examples
/// ```
/// use redcap_core::RegionId;
///
/// let id = RegionId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(usize);

impl RegionId {
    /// Creates a region identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn new(id: usize) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn get(self) -> usize { self.0 }
}

/// A contiguous group of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    members: Vec<usize>,
    ssd: f64,
}

impl Region {
    /// Identifier of the region.
    #[must_use]
    #[rustfmt::skip]
    pub fn id(&self) -> RegionId { self.id }

    /// Member observation ids in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn members(&self) -> &[usize] { &self.members }

    /// Number of members.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.members.len() }

    /// Returns whether the region has no members. Always `false` for
    /// regions produced by the engine.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// Sum of squared deviations of the members around their mean.
    #[must_use]
    #[rustfmt::skip]
    pub fn ssd(&self) -> f64 { self.ssd }
}

/// Output of a [`crate::Redcap::run`] invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Regionalization {
    strategy: Strategy,
    requested: usize,
    regions: Vec<Region>,
    labels: Vec<Option<RegionId>>,
    spanning_tree: Vec<TreeEdge>,
    quality: RegionQuality,
}

impl Regionalization {
    /// Orders `groups` by size (largest first, then smallest member id),
    /// numbers them from zero and derives per-observation labels.
    pub(crate) fn assemble(
        strategy: Strategy,
        requested: usize,
        observations: usize,
        groups: Vec<(Vec<usize>, f64)>,
        spanning_tree: Vec<TreeEdge>,
        quality: RegionQuality,
    ) -> Self {
        let mut groups: Vec<(Vec<usize>, f64)> = groups
            .into_iter()
            .map(|(mut members, ssd)| {
                members.sort_unstable();
                (members, ssd)
            })
            .collect();
        groups.sort_by(|(left, _), (right, _)| {
            right
                .len()
                .cmp(&left.len())
                .then_with(|| left.first().cmp(&right.first()))
        });

        let mut labels = vec![None; observations];
        let regions = groups
            .into_iter()
            .enumerate()
            .map(|(index, (members, ssd))| {
                let id = RegionId(index);
                for &member in &members {
                    if let Some(label) = labels.get_mut(member) {
                        *label = Some(id);
                    }
                }
                Region { id, members, ssd }
            })
            .collect();

        Self {
            strategy,
            requested,
            regions,
            labels,
            spanning_tree,
            quality,
        }
    }

    /// Regions ordered by descending size.
    #[must_use]
    #[rustfmt::skip]
    pub fn regions(&self) -> &[Region] { &self.regions }

    /// Number of regions produced.
    #[must_use]
    #[rustfmt::skip]
    pub fn region_count(&self) -> usize { self.regions.len() }

    /// Number of regions the caller asked for.
    #[must_use]
    #[rustfmt::skip]
    pub fn requested_regions(&self) -> usize { self.requested }

    /// Returns whether constraints prevented reaching the requested count.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.regions.len() < self.requested
    }

    /// One label per observation; `None` for observations flagged invalid.
    #[must_use]
    #[rustfmt::skip]
    pub fn labels(&self) -> &[Option<RegionId>] { &self.labels }

    /// Strategy that built the spanning tree.
    #[must_use]
    #[rustfmt::skip]
    pub fn strategy(&self) -> Strategy { self.strategy }

    /// Edges of the full spanning tree before partitioning.
    #[must_use]
    #[rustfmt::skip]
    pub fn spanning_tree(&self) -> &[TreeEdge] { &self.spanning_tree }

    /// SSD decomposition of the regions.
    #[must_use]
    #[rustfmt::skip]
    pub fn quality(&self) -> RegionQuality { self.quality }

    /// Writes the full spanning tree as an edge list.
    ///
    /// # Errors
    /// Propagates I/O errors from `writer`.
    pub fn write_spanning_tree<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_edge_list(writer, self.labels.len(), &self.spanning_tree)
    }
}
