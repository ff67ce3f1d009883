//! Greedy divisive partitioning of a spanning tree.
//!
//! The least homogeneous tree (highest SSD) is always split next. A tree
//! without an admissible cut becomes a final region on its own and lowers
//! the number of splits still wanted by one.

use std::{cmp::Ordering, collections::BinaryHeap};

use tracing::{instrument, warn};

use crate::{
    error::Result,
    tree::{SpanningTree, SplitWorkers, SsdEvaluator},
};

struct Queued {
    ssd: f64,
    sequence: u64,
    tree: SpanningTree,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl Ord for Queued {
    /// Highest SSD first; among equal scores the earlier tree wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.ssd
            .total_cmp(&other.ssd)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits `tree` into at most `regions` subtrees.
///
/// Fewer trees are returned when some of them cannot be split under the
/// evaluator's constraints. Trees come back in no particular order.
///
/// # Errors
/// Propagates failures from [`SpanningTree::split`] and SSD scoring.
#[instrument(
    name = "core.partition",
    level = "debug",
    skip(tree, evaluator, workers),
    fields(members = tree.len()),
)]
pub fn partition(
    mut tree: SpanningTree,
    regions: usize,
    evaluator: &SsdEvaluator<'_>,
    workers: &SplitWorkers,
) -> Result<Vec<SpanningTree>> {
    let mut target = regions;
    let mut sequence = 0_u64;
    let mut queue = BinaryHeap::new();
    let mut terminal = Vec::new();

    let ssd = tree.score(evaluator)?;
    queue.push(Queued {
        ssd,
        sequence,
        tree,
    });

    while queue.len() < target {
        let Some(Queued { tree, .. }) = queue.pop() else {
            break;
        };
        let Some(split) = tree.split(evaluator, workers)? else {
            warn!(members = tree.len(), "tree cannot be split further");
            terminal.push(tree);
            target -= 1;
            continue;
        };
        let (left, right) = split.into_children();
        for child in [left, right] {
            sequence += 1;
            queue.push(Queued {
                ssd: child.ssd().unwrap_or_default(),
                sequence,
                tree: child,
            });
        }
    }

    let mut trees: Vec<SpanningTree> = queue.into_iter().map(|queued| queued.tree).collect();
    trees.extend(terminal);
    Ok(trees)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use rstest::rstest;

    use super::*;
    use crate::{attributes::AttributeMatrix, tree::ControlConstraint};

    fn chain(values: &[f64]) -> (AttributeMatrix, SpanningTree) {
        let matrix = AttributeMatrix::try_from_rows(
            "chain",
            values.iter().map(|&v| vec![v]).collect(),
        )
        .expect("valid rows");
        let mut tree = SpanningTree::covering(0..values.len());
        for id in 1..values.len() {
            tree.add_edge(id - 1, id, (values[id] - values[id - 1]).abs());
        }
        (matrix, tree)
    }

    fn workers() -> SplitWorkers {
        SplitWorkers::new(NonZeroUsize::new(2)).expect("pool starts")
    }

    fn sorted_members(trees: &[SpanningTree]) -> Vec<Vec<usize>> {
        let mut members: Vec<_> = trees.iter().map(SpanningTree::member_ids).collect();
        members.sort();
        members
    }

    #[rstest]
    fn one_region_returns_the_whole_tree() {
        let (matrix, tree) = chain(&[1.0, 2.0, 3.0]);
        let evaluator = SsdEvaluator::new(&matrix, None);
        let trees = partition(tree, 1, &evaluator, &workers()).expect("healthy");
        assert_eq!(sorted_members(&trees), vec![vec![0, 1, 2]]);
    }

    #[rstest]
    fn worst_tree_is_split_first() {
        let (matrix, tree) = chain(&[1.0, 2.0, 20.0, 21.0, 22.0, 100.0, 101.0]);
        let evaluator = SsdEvaluator::new(&matrix, None);
        let trees = partition(tree, 3, &evaluator, &workers()).expect("healthy");
        assert_eq!(
            sorted_members(&trees),
            vec![vec![0, 1], vec![2, 3, 4], vec![5, 6]]
        );
    }

    #[rstest]
    fn terminal_trees_reduce_the_region_count() {
        let (matrix, tree) = chain(&[1.0, 2.0, 3.0, 4.0]);
        let control = ControlConstraint::new(vec![1.0; 4], 10.0).expect("finite");
        let evaluator = SsdEvaluator::new(&matrix, Some(&control));
        let trees = partition(tree, 3, &evaluator, &workers()).expect("healthy");
        assert_eq!(sorted_members(&trees), vec![vec![0, 1, 2, 3]]);
    }

    #[rstest]
    fn more_regions_than_members_stops_at_pairs() {
        let (matrix, tree) = chain(&[1.0, 5.0, 9.0, 13.0]);
        let evaluator = SsdEvaluator::new(&matrix, None);
        let trees = partition(tree, 10, &evaluator, &workers()).expect("healthy");
        assert_eq!(sorted_members(&trees), vec![vec![0, 1], vec![2, 3]]);
    }

    #[rstest]
    fn queue_orders_by_descending_ssd_then_age() {
        let mut heap = BinaryHeap::new();
        for (sequence, ssd) in [(0, 1.0), (1, 3.0), (2, 3.0)] {
            heap.push(Queued {
                ssd,
                sequence,
                tree: SpanningTree::covering([0]),
            });
        }
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|q| q.sequence)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
