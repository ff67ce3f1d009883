//! Variants that rank every pair of observations and gate merges on
//! contiguity.

use super::{Candidate, PairTable, TreeBuilder, candidates, sort_ascending, sort_for_popping};
use crate::{cluster::ClusterHandle, graph::SpatialGraph};

/// Single linkage over all pairs. Two clusters may merge only while the
/// connectivity table marks them contiguous; the tree receives the shortest
/// contiguity edge bridging them and the scan restarts after every merge.
pub(super) fn single(builder: &mut TreeBuilder<'_>, graph: &SpatialGraph) {
    let mut contiguous = PairTable::filled(graph.observations(), false);
    for edge in graph.edges() {
        contiguous.set(edge.a(), edge.b(), true);
    }
    builder.clusters.seed(graph.nodes());

    let mut tree_edges = candidates(graph.edges());
    sort_ascending(&mut tree_edges);
    let mut ranked = candidates(&graph.full_order_edges(builder.distances));
    sort_ascending(&mut ranked);

    let mut index = 0;
    while let Some(&edge) = ranked.get(index) {
        index += 1;
        let Some((l, m)) = builder.clusters.check_connectivity(edge.a, edge.b) else {
            continue;
        };
        let (l_root, m_root) = (builder.root(l), builder.root(m));
        if !contiguous.get(l_root, m_root) {
            continue;
        }
        let Some(bridge) = take_bridge(builder, &mut tree_edges, l, m) else {
            continue;
        };

        let covered = builder.add(bridge.a, bridge.b);
        for (_, c_root) in builder.others(l) {
            let linked = contiguous.get(c_root, l_root) || contiguous.get(c_root, m_root);
            contiguous.set(c_root, l_root, linked);
        }
        builder.clusters.merge(l, m);
        if covered {
            break;
        }
        index = 0;
    }
}

/// Average linkage over all pairs. An edge passing the cycle and distance
/// tests merges its clusters only when it is itself a contiguity edge, and
/// that edge joins the tree.
pub(super) fn average(builder: &mut TreeBuilder<'_>, graph: &SpatialGraph) {
    let size = graph.observations();
    let mut mean = PairTable::filled(size, 0.0);
    let mut count = PairTable::filled(size, 1.0);
    let mut work = candidates(&graph.full_order_edges(builder.distances));
    for edge in &work {
        mean.set(edge.a, edge.b, edge.length);
    }
    builder.clusters.seed(graph.nodes());

    sort_for_popping(&mut work);
    while let Some(edge) = work.pop() {
        let Some((l, m)) = builder.clusters.check_connectivity(edge.a, edge.b) else {
            continue;
        };
        let (l_root, m_root) = (builder.root(l), builder.root(m));
        if edge.length < mean.get(l_root, m_root) || !graph.is_first_order(edge.a, edge.b) {
            continue;
        }

        let l = builder.clusters.update_by_add(edge.a, edge.b);
        let covered = builder.add(edge.a, edge.b);

        let mut changed = false;
        for (c, c_root) in builder.others(l) {
            let weight = count.get(c_root, l_root) + count.get(c_root, m_root);
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

/// Complete linkage over all pairs. An edge at least as long as the current
/// farthest-pair distance merges its clusters through the shortest
/// contiguity edge bridging them. An edge that passes the distance test while
/// its clusters share no contiguity edge is discarded.
pub(super) fn complete(builder: &mut TreeBuilder<'_>, graph: &SpatialGraph) {
    let size = graph.observations();
    let mut longest = PairTable::filled(size, 0.0_f64);
    let mut ranked = candidates(&graph.full_order_edges(builder.distances));
    for edge in &ranked {
        longest.set(edge.a, edge.b, edge.length);
    }
    builder.clusters.seed(graph.nodes());

    let mut tree_edges = candidates(graph.edges());
    sort_ascending(&mut tree_edges);
    sort_for_popping(&mut ranked);
    while let Some(edge) = ranked.pop() {
        let Some((l, m)) = builder.clusters.check_connectivity(edge.a, edge.b) else {
            continue;
        };
        let (l_root, m_root) = (builder.root(l), builder.root(m));
        if edge.length < longest.get(l_root, m_root) {
            continue;
        }
        let Some(bridge) = take_bridge(builder, &mut tree_edges, l, m) else {
            continue;
        };

        builder.clusters.merge(l, m);
        let covered = builder.add(bridge.a, bridge.b);
        for (_, c_root) in builder.others(l) {
            let distance = longest.get(c_root, l_root).max(longest.get(c_root, m_root));
            longest.set(c_root, l_root, distance);
        }
        if covered {
            break;
        }
    }
}

/// Removes and returns the first remaining contiguity edge joining `l` and
/// `m`.
fn take_bridge(
    builder: &TreeBuilder<'_>,
    tree_edges: &mut Vec<Candidate>,
    l: ClusterHandle,
    m: ClusterHandle,
) -> Option<Candidate> {
    let position = tree_edges
        .iter()
        .position(|edge| builder.bridges(edge, l, m))?;
    Some(tree_edges.remove(position))
}
