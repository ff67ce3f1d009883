//! Variants that agglomerate over first-order contiguity edges only.

use super::{PairTable, TreeBuilder, candidates, sort_ascending, sort_for_popping};
use crate::graph::SpatialGraph;

/// Kruskal over contiguity edges in ascending length order.
pub(super) fn single(builder: &mut TreeBuilder<'_>, graph: &SpatialGraph) {
    let mut edges = candidates(graph.edges());
    sort_ascending(&mut edges);
    for edge in edges {
        if builder.clusters.check_connectivity(edge.a, edge.b).is_none() {
            continue;
        }
        builder.clusters.update_by_add(edge.a, edge.b);
        if builder.add(edge.a, edge.b) {
            break;
        }
    }
}

/// Average linkage: after each merge the lengths of edges touching the new
/// cluster become the weighted mean inter-cluster distance and the working
/// list is re-sorted.
pub(super) fn average(builder: &mut TreeBuilder<'_>, graph: &SpatialGraph) {
    let size = graph.observations();
    let mut mean = PairTable::filled(size, 0.0);
    let mut count = PairTable::filled(size, 0.0);
    for edge in graph.edges() {
        mean.set(edge.a(), edge.b(), edge.length());
        count.set(edge.a(), edge.b(), 1.0);
    }
    builder.clusters.seed(graph.nodes());

    let mut work = candidates(graph.edges());
    sort_for_popping(&mut work);
    while let Some(edge) = work.pop() {
        let Some((l, m)) = builder.clusters.check_connectivity(edge.a, edge.b) else {
            continue;
        };
        let (l_root, m_root) = (builder.root(l), builder.root(m));
        if edge.length < mean.get(l_root, m_root) {
            continue;
        }

        let l = builder.clusters.update_by_add(edge.a, edge.b);
        let covered = builder.add(edge.a, edge.b);

        let mut changed = false;
        for (c, c_root) in builder.others(l) {
            let weight = count.get(c_root, l_root) + count.get(c_root, m_root);
            if weight <= 0.0 {
                continue;
            }
            let distance = (mean.get(c_root, l_root) * count.get(c_root, l_root)
                + mean.get(c_root, m_root) * count.get(c_root, m_root))
                / weight;
            mean.set(c_root, l_root, distance);
            count.set(c_root, l_root, weight);
            changed |= builder.relabel(&mut work, c, l, distance);
        }
        if changed {
            sort_for_popping(&mut work);
        }
        if covered {
            break;
        }
    }
}

/// Complete linkage: the inter-cluster distance is the longest contiguous
/// pair, tracked in a table; edge lengths are never rewritten.
pub(super) fn complete(builder: &mut TreeBuilder<'_>, graph: &SpatialGraph) {
    let size = graph.observations();
    let mut longest = PairTable::filled(size, 0.0_f64);
    for edge in graph.edges() {
        longest.set(edge.a(), edge.b(), edge.length());
    }
    builder.clusters.seed(graph.nodes());

    let mut work = candidates(graph.edges());
    sort_for_popping(&mut work);
    while let Some(edge) = work.pop() {
        let Some((l, m)) = builder.clusters.check_connectivity(edge.a, edge.b) else {
            continue;
        };
        let (l_root, m_root) = (builder.root(l), builder.root(m));
        if edge.length < longest.get(l_root, m_root) {
            continue;
        }

        let l = builder.clusters.update_by_add(edge.a, edge.b);
        let covered = builder.add(edge.a, edge.b);
        for (_, c_root) in builder.others(l) {
            let distance = longest.get(c_root, l_root).max(longest.get(c_root, m_root));
            longest.set(c_root, l_root, distance);
        }
        if covered {
            break;
        }
    }
}
