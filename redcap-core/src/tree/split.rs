//! Best-cut search over a spanning tree.
//!
//! Every tree edge is a candidate cut. The edge list is divided into
//! contiguous chunks, one per worker; each worker scans its chunk in order
//! and keeps its local best. The reduction runs on the calling thread after
//! all workers have joined and prefers the lowest edge index among equal
//! scores, so the chosen cut does not depend on the worker count.

use std::{num::NonZeroUsize, ops::Range};

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use tracing::{debug, instrument};

use super::{SpanningTree, SsdEvaluator, TreeEdge};
use crate::error::{RedcapError, Result};

/// Fixed-size worker pool used by [`SpanningTree::split`].
#[derive(Debug)]
pub struct SplitWorkers {
    pool: ThreadPool,
    workers: usize,
}

impl SplitWorkers {
    /// Starts a pool with `workers` threads, or one per available core when
    /// `None`.
    ///
    /// # Errors
    /// Returns [`RedcapError::WorkerPool`] when the threads cannot be
    /// spawned.
    pub fn new(workers: Option<NonZeroUsize>) -> Result<Self> {
        let workers = workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("redcap-split-{index}"))
            .build()
            .map_err(|err| RedcapError::WorkerPool {
                message: err.to_string().into(),
            })?;
        Ok(Self { pool, workers })
    }

    /// Number of worker threads.
    #[must_use]
    #[rustfmt::skip]
    pub fn workers(&self) -> usize { self.workers }
}

/// The outcome of a successful cut: the removed edge and the two subtrees.
#[derive(Clone, Debug)]
pub struct TreeSplit {
    cut: TreeEdge,
    score: f64,
    left: SpanningTree,
    right: SpanningTree,
}

impl TreeSplit {
    /// The removed edge.
    #[must_use]
    #[rustfmt::skip]
    pub fn cut(&self) -> TreeEdge { self.cut }

    /// Sum of the two subtrees' SSD values.
    #[must_use]
    #[rustfmt::skip]
    pub fn score(&self) -> f64 { self.score }

    /// Subtree containing the cut's first endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn left(&self) -> &SpanningTree { &self.left }

    /// Subtree containing the cut's second endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn right(&self) -> &SpanningTree { &self.right }

    /// Consumes the split, yielding `(left, right)`.
    #[must_use]
    pub fn into_children(self) -> (SpanningTree, SpanningTree) {
        (self.left, self.right)
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    edge: usize,
    score: f64,
}

impl SpanningTree {
    /// Finds the edge whose removal minimises the summed SSD of the two
    /// resulting subtrees and materialises both halves.
    ///
    /// An edge is admissible only when both halves can form a region (see
    /// [`SsdEvaluator::evaluate`]). Returns `Ok(None)` when no edge is
    /// admissible; the tree is then terminal.
    ///
    /// # Errors
    /// Propagates [`RedcapError::LockPoisoned`] from the SSD caches.
    #[instrument(
        name = "core.split",
        level = "debug",
        skip_all,
        fields(members = self.len(), edges = self.edges.len(), workers = workers.workers()),
    )]
    pub fn split(
        &self,
        evaluator: &SsdEvaluator<'_>,
        workers: &SplitWorkers,
    ) -> Result<Option<TreeSplit>> {
        let ranges = chunk_ranges(self.edges.len(), workers.workers());
        let locals = workers.pool.install(|| {
            ranges
                .par_iter()
                .map(|range| self.best_in_range(range.clone(), evaluator))
                .collect::<Result<Vec<_>>>()
        })?;

        let best = locals.into_iter().flatten().reduce(|best, candidate| {
            let better = candidate.score < best.score
                || (candidate.score == best.score && candidate.edge < best.edge);
            if better { candidate } else { best }
        });
        let Some(best) = best else {
            debug!("no admissible cut");
            return Ok(None);
        };

        let cut = self.edges[best.edge];
        let mut left = self.detach(cut.a(), cut.b());
        let mut right = self.detach(cut.b(), cut.a());
        left.score(evaluator)?;
        right.score(evaluator)?;
        debug!(
            a = cut.a(),
            b = cut.b(),
            score = best.score,
            left = left.len(),
            right = right.len(),
            "accepted cut"
        );
        Ok(Some(TreeSplit {
            cut,
            score: best.score,
            left,
            right,
        }))
    }

    fn best_in_range(
        &self,
        range: Range<usize>,
        evaluator: &SsdEvaluator<'_>,
    ) -> Result<Option<Candidate>> {
        let mut best: Option<Candidate> = None;
        for index in range {
            let edge = self.edges[index];
            let left = self.sub_tree(edge.a(), edge.b());
            let right = self.sub_tree(edge.b(), edge.a());
            let (Some(left), Some(right)) = (evaluator.evaluate(&left)?, evaluator.evaluate(&right)?)
            else {
                continue;
            };
            let score = left + right;
            if best.is_none_or(|current| score < current.score) {
                best = Some(Candidate { edge: index, score });
            }
        }
        Ok(best)
    }
}

/// Contiguous ranges covering `0..len`, at most `workers` of them, with the
/// first `len % count` ranges one element longer.
fn chunk_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    let count = workers.min(len);
    if count == 0 {
        return Vec::new();
    }
    let quotient = len / count;
    let remainder = len % count;
    let mut start = 0;
    (0..count)
        .map(|index| {
            let size = quotient + usize::from(index < remainder);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}
