use std::collections::HashSet;

use redcap_test_support::lattice::Lattice;
use rstest::rstest;

use super::*;
use crate::{contiguity::Contiguity, tree::TreeEdge};

/// Rook contiguity for a `rows` x `cols` lattice numbered row-major.
fn lattice(rows: usize, cols: usize) -> Contiguity {
    let grid = Lattice::new(rows, cols);
    let links = grid.rook_links().into_iter().map(|(a, b)| (a, b, None));
    Contiguity::from_links(grid.len(), links).expect("lattice links are in range")
}

fn build(
    strategy: Strategy,
    contiguity: &Contiguity,
    values: &[f64],
    mask: &[bool],
) -> Result<SpanningTree> {
    let distances =
        PairwiseDistances::from_fn(values.len(), |i, j| (values[i] - values[j]).abs())
            .expect("finite");
    let graph = SpatialGraph::first_order(mask, contiguity, &distances).expect("valid graph");
    build_spanning_tree(strategy, &graph, &distances)
}

fn assert_is_tree(tree: &SpanningTree, nodes: &[usize], contiguity: &Contiguity) {
    assert!(tree.is_fully_covered());
    assert_eq!(tree.edges().len(), nodes.len() - 1);
    assert_eq!(tree.member_ids(), nodes);
    let mut seen = HashSet::new();
    for edge in tree.edges() {
        assert!(
            contiguity.neighbours(edge.a()).any(|(n, _)| n == edge.b()),
            "tree edge {}-{} is not contiguous",
            edge.a(),
            edge.b()
        );
        assert!(seen.insert((edge.a().min(edge.b()), edge.a().max(edge.b()))));
    }
}

#[rstest]
fn every_strategy_spans_a_lattice(
    #[values(
        Strategy::FirstOrderSingle,
        Strategy::FirstOrderAverage,
        Strategy::FirstOrderComplete,
        Strategy::FullOrderSingle,
        Strategy::FullOrderAverage,
        Strategy::FullOrderComplete
    )]
    strategy: Strategy,
) {
    let contiguity = lattice(3, 4);
    let values = [5.0, 1.0, 7.0, 2.0, 9.0, 3.0, 3.5, 8.0, 0.5, 6.0, 4.0, 1.5];
    let tree = build(strategy, &contiguity, &values, &[true; 12]).expect("lattice is connected");
    let nodes: Vec<usize> = (0..12).collect();
    assert_is_tree(&tree, &nodes, &contiguity);
}

#[rstest]
fn every_strategy_spans_a_queen_lattice(
    #[values(
        Strategy::FirstOrderSingle,
        Strategy::FirstOrderAverage,
        Strategy::FirstOrderComplete,
        Strategy::FullOrderSingle,
        Strategy::FullOrderAverage,
        Strategy::FullOrderComplete
    )]
    strategy: Strategy,
) {
    let contiguity = Contiguity::from_neighbours(Lattice::new(3, 3).queen());
    let values = [4.0, 0.5, 8.0, 2.5, 6.0, 1.0, 7.5, 3.0, 5.5];
    let tree = build(strategy, &contiguity, &values, &[true; 9]).expect("lattice is connected");
    let nodes: Vec<usize> = (0..9).collect();
    assert_is_tree(&tree, &nodes, &contiguity);
}

#[rstest]
fn first_order_single_is_a_minimum_spanning_tree() {
    let contiguity = lattice(2, 3);
    let values = [0.0, 1.0, 5.0, 0.5, 4.0, 4.5];
    let tree = build(Strategy::FirstOrderSingle, &contiguity, &values, &[true; 6])
        .expect("connected");
    let total: f64 = tree.edges().iter().map(TreeEdge::length).sum();
    // 0-3, 2-5, 4-5 at 0.5 each, then 0-1 (1.0) and 1-4 (3.0)
    assert!((total - 5.5).abs() < 1e-12, "total length {total}");
}

#[rstest]
fn invalid_observations_are_left_out() {
    let contiguity = lattice(1, 4);
    let values = [1.0, 2.0, 3.0, 4.0];
    let mask = [true, true, true, false];
    let tree = build(Strategy::FirstOrderAverage, &contiguity, &values, &mask).expect("connected");
    assert_is_tree(&tree, &[0, 1, 2], &contiguity);
}

#[rstest]
fn single_valid_observation_needs_no_edges(
    #[values(Strategy::FirstOrderSingle, Strategy::FullOrderComplete)] strategy: Strategy,
) {
    let contiguity = lattice(1, 2);
    let tree = build(strategy, &contiguity, &[1.0, 2.0], &[false, true]).expect("trivially covered");
    assert_eq!(tree.member_ids(), vec![1]);
    assert!(tree.edges().is_empty());
}

#[rstest]
fn disconnected_graph_is_reported(
    #[values(
        Strategy::FirstOrderSingle,
        Strategy::FirstOrderAverage,
        Strategy::FirstOrderComplete,
        Strategy::FullOrderSingle,
        Strategy::FullOrderAverage,
        Strategy::FullOrderComplete
    )]
    strategy: Strategy,
) {
    let contiguity = Contiguity::from_links(5, [(0, 1, None), (1, 2, None), (3, 4, None)])
        .expect("links in range");
    let err = build(strategy, &contiguity, &[1.0, 2.0, 3.0, 4.0, 5.0], &[true; 5])
        .expect_err("two islands cannot be spanned");
    let RedcapError::GraphNotConnected { covered, expected } = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(expected, 5);
    assert!(covered < expected);
}

#[rstest]
fn full_order_variants_only_use_contiguity_edges() {
    // 0 and 2 are identical but not neighbours
    let contiguity = lattice(1, 3);
    let values = [1.0, 10.0, 1.0];
    for strategy in [
        Strategy::FullOrderSingle,
        Strategy::FullOrderAverage,
        Strategy::FullOrderComplete,
    ] {
        let tree = build(strategy, &contiguity, &values, &[true; 3]).expect("connected");
        assert_is_tree(&tree, &[0, 1, 2], &contiguity);
    }
}

#[rstest]
fn full_order_complete_discards_edges_without_a_bridge() {
    // 0 1 2
    // 3 4 5
    // 2-3 and then 0-5 pass the distance test before their clusters touch.
    let contiguity = lattice(2, 3);
    let values = [24.0, 25.0, 2.0, 4.0, 19.0, 28.0];
    let tree = build(Strategy::FullOrderComplete, &contiguity, &values, &[true; 6])
        .expect("connected");
    assert_is_tree(&tree, &[0, 1, 2, 3, 4, 5], &contiguity);
    let mut edges: Vec<(usize, usize)> = tree
        .edges()
        .iter()
        .map(|edge| (edge.a().min(edge.b()), edge.a().max(edge.b())))
        .collect();
    edges.sort_unstable();
    assert_eq!(edges, vec![(0, 1), (1, 2), (1, 4), (3, 4), (4, 5)]);
}

#[rstest]
#[case("first-order-single", Strategy::FirstOrderSingle)]
#[case("first-order-average", Strategy::FirstOrderAverage)]
#[case("first-order-complete", Strategy::FirstOrderComplete)]
#[case("full-order-single", Strategy::FullOrderSingle)]
#[case("full-order-average", Strategy::FullOrderAverage)]
#[case("full-order-complete", Strategy::FullOrderComplete)]
fn names_round_trip(#[case] name: &str, #[case] strategy: Strategy) {
    assert_eq!(name.parse::<Strategy>(), Ok(strategy));
    assert_eq!(strategy.to_string(), name);
    assert_eq!(
        Strategy::new(strategy.edge_order(), strategy.linkage()),
        strategy
    );
}

#[rstest]
fn unknown_names_are_rejected() {
    assert_eq!(
        "ward".parse::<Strategy>(),
        Err(ParseStrategyError("ward".to_owned()))
    );
}

#[rstest]
fn pair_table_is_symmetric() {
    let mut table = PairTable::filled(3, 0.0);
    table.set(2, 0, 4.0);
    assert_eq!(table.get(0, 2), 4.0);
    assert_eq!(table.get(2, 0), 4.0);
    assert_eq!(table.get(1, 1), 0.0);
}
