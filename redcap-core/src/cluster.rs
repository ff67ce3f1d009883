//! Cluster tracking during spanning-tree construction.
//!
//! [`ClusterManager`] keeps a disjoint partition of observations into
//! clusters that grow as strategies accept edges. Clusters live in an arena
//! addressed by [`ClusterHandle`]; an absorbed cluster's slot is cleared and
//! never reused. Each cluster keeps a stable root observation that keys the
//! linkage tables maintained by the average and complete strategies.

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ClusterHandle(usize);

#[derive(Clone, Debug)]
struct Cluster {
    root: usize,
    members: Vec<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct ClusterManager {
    owner: Vec<Option<ClusterHandle>>,
    clusters: Vec<Option<Cluster>>,
}

impl ClusterManager {
    pub(crate) fn new(observations: usize) -> Self {
        Self {
            owner: vec![None; observations],
            clusters: Vec::new(),
        }
    }

    /// Creates a singleton cluster for every id that has none yet.
    pub(crate) fn seed(&mut self, ids: &[usize]) {
        for &id in ids {
            self.cluster_of(id);
        }
    }

    /// Resolves the cluster holding `id`, creating a singleton on first use.
    pub(crate) fn cluster_of(&mut self, id: usize) -> ClusterHandle {
        if let Some(handle) = self.owner[id] {
            return handle;
        }
        let handle = ClusterHandle(self.clusters.len());
        self.clusters.push(Some(Cluster {
            root: id,
            members: vec![id],
        }));
        self.owner[id] = Some(handle);
        handle
    }

    /// Returns the clusters of `a` and `b` when they differ and each endpoint
    /// is a member of the cluster resolved for it. `None` means the edge
    /// would close a cycle.
    pub(crate) fn check_connectivity(
        &mut self,
        a: usize,
        b: usize,
    ) -> Option<(ClusterHandle, ClusterHandle)> {
        let l = self.cluster_of(a);
        let m = self.cluster_of(b);
        if l == m {
            return None;
        }
        let straight = self.has(l, a) && self.has(m, b);
        let crossed = self.has(l, b) && self.has(m, a);
        (straight || crossed).then_some((l, m))
    }

    /// Merges the clusters joined by the edge `(a, b)`; the cluster of `a`
    /// survives.
    pub(crate) fn update_by_add(&mut self, a: usize, b: usize) -> ClusterHandle {
        let l = self.cluster_of(a);
        let m = self.cluster_of(b);
        if l == m {
            return l;
        }
        self.merge(l, m)
    }

    /// Moves every member of `absorb` into `keep` and destroys `absorb`.
    /// `keep` retains its root.
    pub(crate) fn merge(&mut self, keep: ClusterHandle, absorb: ClusterHandle) -> ClusterHandle {
        if keep == absorb {
            return keep;
        }
        let Some(absorbed) = self.clusters[absorb.0].take() else {
            return keep;
        };
        for &member in &absorbed.members {
            self.owner[member] = Some(keep);
        }
        if let Some(cluster) = self.clusters[keep.0].as_mut() {
            cluster.members.extend(absorbed.members);
        }
        keep
    }

    pub(crate) fn has(&self, cluster: ClusterHandle, id: usize) -> bool {
        self.owner.get(id).copied().flatten() == Some(cluster)
    }

    /// Root observation of a live cluster.
    pub(crate) fn root(&self, cluster: ClusterHandle) -> Option<usize> {
        self.clusters[cluster.0].as_ref().map(|c| c.root)
    }

    /// Live clusters in creation order.
    pub(crate) fn live_clusters(&self) -> impl Iterator<Item = ClusterHandle> + '_ {
        self.clusters
            .iter()
            .enumerate()
            .filter_map(|(slot, cluster)| cluster.as_ref().map(|_| ClusterHandle(slot)))
    }
}
