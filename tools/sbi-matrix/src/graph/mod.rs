//! Contraction Hierarchy graph access
//!
//! The matrix engine never builds a hierarchy itself. It reads a leveled graph
//! through [`RoutingChGraph`], which exposes two views of every node:
//!
//! - `edges`: the per-request view, including virtual nodes injected where a
//!   request point snapped onto the interior of an edge
//! - `base_edges`: the preprocessed hierarchy only, used while propagating
//!   buckets through real nodes
//!
//! Virtual nodes have ids `>= base_node_count()` and always report level 0.

pub mod ch;
pub mod query;

pub use ch::{Adjacency, ChGraph, ChGraphBuilder, EdgeRecord};
pub use query::{QueryGraph, QueryGraphBuilder};

/// Node identifier (real nodes first, virtual nodes after them)
pub type NodeId = u32;

/// Traversal direction of an adjacency list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Outgoing edges: `node -> adj`
    Forward,
    /// Incoming edges: `adj -> node`
    Backward,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// One directed edge as seen from the node whose adjacency list holds it.
///
/// `weight`, `time` and `distance` are the costs of travelling the edge in its
/// own direction: `node -> adj` in a forward list, `adj -> node` in a backward
/// list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChEdge {
    pub adj: NodeId,
    pub weight: f64,
    /// Travel time in milliseconds
    pub time: u64,
    /// Physical length in meters
    pub distance: f64,
    pub shortcut: bool,
}

impl ChEdge {
    /// Edges with an infinite weight are inaccessible in this direction
    #[inline]
    pub fn is_accessible(&self) -> bool {
        self.weight.is_finite()
    }
}

/// Read-only leveled graph consumed by the matrix calculators
pub trait RoutingChGraph {
    /// Number of preprocessed (real) nodes
    fn base_node_count(&self) -> usize;

    /// Number of nodes including virtual ones
    fn node_count(&self) -> usize {
        self.base_node_count()
    }

    #[inline]
    fn is_virtual(&self, node: NodeId) -> bool {
        node as usize >= self.base_node_count()
    }

    /// Hierarchy level of a node, 0 for virtual nodes
    fn level(&self, node: NodeId) -> u32;

    /// Edges of the per-request view (virtual edges included)
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = ChEdge> + '_;

    /// Edges of the preprocessed hierarchy only (empty for virtual nodes)
    fn base_edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = ChEdge> + '_;
}

/// Hierarchy edge filter.
///
/// Virtual-incident edges and shortcuts are always eligible (shortcuts are
/// only stored at their lower endpoint). Any other edge must not lead to a
/// strictly lower level.
#[inline]
pub fn accept_hierarchy_edge<G: RoutingChGraph>(graph: &G, base: NodeId, edge: &ChEdge) -> bool {
    if graph.is_virtual(base) || graph.is_virtual(edge.adj) {
        return true;
    }
    if edge.shortcut {
        return true;
    }
    graph.level(base) <= graph.level(edge.adj)
}
