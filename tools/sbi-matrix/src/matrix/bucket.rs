//! Bucket entries and the per-node bookkeeping of one sweep

use std::cmp::Ordering;

use crate::graph::NodeId;

/// Best known partial path between a node and one request point
///
/// In the backward sweep the path leads from the node to a destination, in
/// the forward sweep from an origin to the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub weight: f64,
    pub time: u64,
    pub distance: f64,
    /// Index of the origin or destination in its request list
    pub point: u32,
}

impl Bucket {
    /// Zero-cost entry placed at a seed node
    pub fn seed(point: u32) -> Self {
        Self {
            weight: 0.0,
            time: 0,
            distance: 0.0,
            point,
        }
    }

    /// This bucket extended by one more edge
    #[inline]
    pub fn extend(&self, edge: &DownEdge) -> Self {
        Self {
            weight: self.weight + edge.weight,
            time: self.time.saturating_add(edge.time),
            distance: self.distance + edge.distance,
            point: self.point,
        }
    }
}

/// Buckets stored at one node, at most one per point, ordered by point index
#[derive(Debug, Clone, Default)]
pub struct BucketTable {
    entries: Vec<Bucket>,
}

impl BucketTable {
    pub fn get(&self, point: u32) -> Option<&Bucket> {
        self.entries
            .binary_search_by_key(&point, |b| b.point)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Keep `candidate` if its point has no entry yet or it is strictly
    /// lighter than the current one. Returns whether the table changed.
    pub fn offer(&mut self, candidate: Bucket) -> bool {
        match self.entries.binary_search_by_key(&candidate.point, |b| b.point) {
            Ok(i) => {
                if candidate.weight < self.entries[i].weight {
                    self.entries[i] = candidate;
                    true
                } else {
                    false
                }
            }
            Err(i) => {
                self.entries.insert(i, candidate);
                true
            }
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&Bucket) -> bool) {
        self.entries.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pending merge: buckets of `base` can be extended into the owning node.
///
/// Costs are those of the path segment between the two nodes in the sweep's
/// travel direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownEdge {
    pub base: NodeId,
    pub weight: f64,
    pub time: u64,
    pub distance: f64,
}

/// Pending prune check: buckets of `base` may be dominated by a path through
/// the owning node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpEdge {
    pub base: NodeId,
    pub weight: f64,
}

/// Heap entry ordered by hierarchy level, lowest first
#[derive(Debug, Clone, Copy)]
pub struct RankedNode {
    pub node: NodeId,
    pub level: u32,
    /// Seed node without any accessible upward neighbor; its downward edges
    /// bypass the hierarchy filter
    pub no_accessible_neighbor: bool,
}

impl RankedNode {
    pub fn new(node: NodeId, level: u32) -> Self {
        Self {
            node,
            level,
            no_accessible_neighbor: false,
        }
    }

    pub fn seed(node: NodeId, level: u32, no_accessible_neighbor: bool) -> Self {
        Self {
            node,
            level,
            no_accessible_neighbor,
        }
    }
}

impl PartialEq for RankedNode {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.node == other.node
    }
}

impl Eq for RankedNode {}

impl PartialOrd for RankedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower level = higher priority, ties by node id
        other
            .level
            .cmp(&self.level)
            .then_with(|| other.node.cmp(&self.node))
    }
}
