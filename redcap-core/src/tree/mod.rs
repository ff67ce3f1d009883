//! Spanning trees over observation subsets.
//!
//! A [`SpanningTree`] is an arena: nodes are stored in a vector and refer to
//! their neighbours by slot, so trees copy cheaply and never alias the graph
//! they were built from. Strategies grow the full tree edge by edge with
//! [`SpanningTree::add_edge`]; the partitioner then cuts it recursively with
//! [`SpanningTree::split`], each cut producing two detached subtrees.

mod split;
mod ssd;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

pub use self::{
    split::{SplitWorkers, TreeSplit},
    ssd::{ControlConstraint, SsdEvaluator},
};
use crate::error::Result;

/// An undirected tree edge between two observations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeEdge {
    a: usize,
    b: usize,
    length: f64,
}

impl TreeEdge {
    /// Returns the first endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn a(&self) -> usize { self.a }

    /// Returns the second endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn b(&self) -> usize { self.b }

    /// Returns the edge length recorded when the edge was added.
    #[must_use]
    #[rustfmt::skip]
    pub fn length(&self) -> f64 { self.length }
}

#[derive(Clone, Debug)]
struct TreeNode {
    id: usize,
    // (neighbour slot, edge index)
    neighbours: Vec<(usize, usize)>,
}

/// A connected, acyclic structure over a set of member observations.
#[derive(Clone, Debug)]
pub struct SpanningTree {
    members: BTreeMap<usize, bool>,
    nodes: Vec<TreeNode>,
    slots: HashMap<usize, usize>,
    edges: Vec<TreeEdge>,
    edge_keys: HashSet<(usize, usize)>,
    root: Option<usize>,
    ssd: Option<f64>,
}

impl SpanningTree {
    /// Creates an empty tree that must eventually cover `ids`.
    ///
    /// # Examples
    /// ```
    /// use redcap_core::SpanningTree;
    ///
    /// let mut tree = SpanningTree::covering([0, 1, 2]);
    /// assert!(tree.add_edge(0, 1, 1.0));
    /// assert!(!tree.add_edge(1, 0, 1.0));
    /// assert!(!tree.is_fully_covered());
    /// assert!(tree.add_edge(1, 2, 2.0));
    /// assert!(tree.is_fully_covered());
    /// ```
    #[must_use]
    pub fn covering(ids: impl IntoIterator<Item = usize>) -> Self {
        Self {
            members: ids.into_iter().map(|id| (id, false)).collect(),
            nodes: Vec::new(),
            slots: HashMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
            root: None,
            ssd: None,
        }
    }

    /// Adds the edge `(a, b)` unless one already joins the same endpoints in
    /// either direction. The first endpoint ever added becomes the root.
    ///
    /// Returns `false` for a duplicate edge.
    pub fn add_edge(&mut self, a: usize, b: usize, length: f64) -> bool {
        if !self.edge_keys.insert(key(a, b)) {
            return false;
        }
        let slot_a = self.slot_for(a);
        let slot_b = self.slot_for(b);
        self.members.insert(a, true);
        self.members.insert(b, true);
        self.root.get_or_insert(slot_a);

        let index = self.edges.len();
        self.edges.push(TreeEdge { a, b, length });
        self.nodes[slot_a].neighbours.push((slot_b, index));
        self.nodes[slot_b].neighbours.push((slot_a, index));
        self.ssd = None;
        true
    }

    /// Returns whether every member has been reached by an edge and a
    /// breadth-first walk from the root visits exactly the member set.
    ///
    /// A tree with a single member is trivially covered.
    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        if self.members.len() == 1 && self.edges.is_empty() {
            return true;
        }
        if self.members.values().any(|&added| !added) {
            return false;
        }
        let Some(root) = self.root else {
            return false;
        };
        self.walk(root, None).len() == self.members.len()
    }

    /// Member ids reachable from `from` without stepping onto `excluded`,
    /// in ascending order. Empty when `from` has no node in this tree.
    #[must_use]
    pub fn sub_tree(&self, from: usize, excluded: usize) -> Vec<usize> {
        let Some(&start) = self.slots.get(&from) else {
            return Vec::new();
        };
        let blocked = self.slots.get(&excluded).copied();
        let mut ids: Vec<usize> = self
            .walk(start, blocked)
            .into_iter()
            .map(|slot| self.nodes[slot].id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Copies the component containing `from` into a new tree, not crossing
    /// onto `excluded`. Edge lengths are preserved and every copied member
    /// is marked covered.
    #[must_use]
    pub fn detach(&self, from: usize, excluded: usize) -> Self {
        let Some(&start) = self.slots.get(&from) else {
            return Self::covering([from]);
        };
        let blocked = self.slots.get(&excluded).copied();
        let reached = self.walk(start, blocked);
        let inside: HashSet<usize> = reached.iter().copied().collect();

        let mut tree = Self::covering(reached.iter().map(|&slot| self.nodes[slot].id));
        let origin = tree.slot_for(from);
        tree.root = Some(origin);
        tree.members.insert(from, true);
        for &slot in &reached {
            for &(next, edge) in &self.nodes[slot].neighbours {
                if inside.contains(&next) {
                    let TreeEdge { a, b, length } = self.edges[edge];
                    tree.add_edge(a, b, length);
                }
            }
        }
        tree
    }

    /// Ids of all members in ascending order.
    #[must_use]
    pub fn member_ids(&self) -> Vec<usize> {
        self.members.keys().copied().collect()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the tree has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Edges in insertion order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[TreeEdge] { &self.edges }

    /// Id of the root observation, once an edge has been added.
    #[must_use]
    pub fn root(&self) -> Option<usize> {
        self.root.map(|slot| self.nodes[slot].id)
    }

    /// Score recorded by [`SpanningTree::score`], if any.
    #[must_use]
    #[rustfmt::skip]
    pub fn ssd(&self) -> Option<f64> { self.ssd }

    /// Computes and records the SSD of the full member set.
    ///
    /// # Errors
    /// Propagates [`SsdEvaluator::compute_ssd`] failures.
    pub fn score(&mut self, evaluator: &SsdEvaluator<'_>) -> Result<f64> {
        if let Some(ssd) = self.ssd {
            return Ok(ssd);
        }
        let ssd = evaluator.compute_ssd(&self.member_ids())?;
        self.ssd = Some(ssd);
        Ok(ssd)
    }

    /// Number of members reachable from the root.
    pub(crate) fn reached(&self) -> usize {
        self.root.map_or(usize::from(self.members.len() == 1), |root| {
            self.walk(root, None).len()
        })
    }

    fn slot_for(&mut self, id: usize) -> usize {
        if let Some(&slot) = self.slots.get(&id) {
            return slot;
        }
        let slot = self.nodes.len();
        self.nodes.push(TreeNode {
            id,
            neighbours: Vec::new(),
        });
        self.slots.insert(id, slot);
        slot
    }

    /// Breadth-first walk returning visited slots in visit order.
    fn walk(&self, start: usize, blocked: Option<usize>) -> Vec<usize> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(slot) = queue.pop_front() {
            order.push(slot);
            for &(next, _) in &self.nodes[slot].neighbours {
                if Some(next) == blocked || seen[next] {
                    continue;
                }
                seen[next] = true;
                queue.push_back(next);
            }
        }
        order
    }
}

const fn key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
