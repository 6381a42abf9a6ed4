//! Per-request query graph with virtual nodes
//!
//! A point that snaps onto the interior of an original edge `a - b` becomes a
//! virtual node. All virtual nodes on the same edge are chained in position
//! order (`a - v1 - v2 - b`), the costs of the original edge are split
//! proportionally over the chain, and the original edge disappears from the
//! query view. The preprocessed hierarchy stays untouched and is still exposed
//! through `base_edges`.

use rustc_hash::{FxHashMap, FxHashSet};
use sbi_common::{Error, Result};

use super::{ChEdge, ChGraph, Direction, NodeId, RoutingChGraph};
use crate::matrix::Snap;

/// One virtual position on an undirected original edge `low - high`
#[derive(Debug, Clone, Copy)]
struct EdgePosition {
    low: NodeId,
    high: NodeId,
    /// Position measured from `low`
    fraction: f64,
    node: NodeId,
}

/// Resolves request points and builds the matching [`QueryGraph`]
pub struct QueryGraphBuilder<'a> {
    graph: &'a ChGraph,
    positions: Vec<EdgePosition>,
    by_position: FxHashMap<(NodeId, NodeId, u64), NodeId>,
}

impl<'a> QueryGraphBuilder<'a> {
    pub fn new(graph: &'a ChGraph) -> Self {
        Self {
            graph,
            positions: Vec::new(),
            by_position: FxHashMap::default(),
        }
    }

    /// Snap directly onto a real node
    pub fn snap_node(&self, node: NodeId) -> Result<Snap> {
        self.graph.check_node(node)?;
        Ok(Snap::new(node))
    }

    /// Snap onto the original edge between `base` and `adj` at `fraction`
    /// (0 = `base`, 1 = `adj`).
    ///
    /// Either direction of the edge may exist. Fractions 0 and 1 resolve to the
    /// endpoint itself; identical interior positions share one virtual node.
    pub fn snap_edge(&mut self, base: NodeId, adj: NodeId, fraction: f64) -> Result<Snap> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidFraction(fraction));
        }
        self.graph.check_node(base)?;
        self.graph.check_node(adj)?;
        if self.graph.find_original_edge(base, adj).is_none()
            && self.graph.find_original_edge(adj, base).is_none()
        {
            return Err(Error::EdgeNotFound { base, adj });
        }

        if fraction == 0.0 {
            return Ok(Snap::new(base));
        }
        if fraction == 1.0 {
            return Ok(Snap::new(adj));
        }

        let (low, high, fraction) = if base < adj {
            (base, adj, fraction)
        } else {
            (adj, base, 1.0 - fraction)
        };

        let key = (low, high, fraction.to_bits());
        if let Some(&node) = self.by_position.get(&key) {
            return Ok(Snap::new(node));
        }

        let node = (self.graph.n_nodes() + self.positions.len()) as NodeId;
        self.positions.push(EdgePosition {
            low,
            high,
            fraction,
            node,
        });
        self.by_position.insert(key, node);
        Ok(Snap::new(node))
    }

    pub fn n_virtual_nodes(&self) -> usize {
        self.positions.len()
    }

    pub fn build(self) -> QueryGraph<'a> {
        let mut query = QueryGraph::new(self.graph);
        query.n_virtual = self.positions.len();

        let mut per_edge: FxHashMap<(NodeId, NodeId), Vec<EdgePosition>> = FxHashMap::default();
        for position in &self.positions {
            per_edge
                .entry((position.low, position.high))
                .or_default()
                .push(*position);
        }

        for ((low, high), mut positions) in per_edge {
            positions.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));

            let mut chain = Vec::with_capacity(positions.len() + 2);
            chain.push((low, 0.0));
            chain.extend(positions.iter().map(|p| (p.node, p.fraction)));
            chain.push((high, 1.0));

            if let Some(edge) = self.graph.find_original_edge(low, high) {
                for pair in chain.windows(2) {
                    let (from, f_from) = pair[0];
                    let (to, f_to) = pair[1];
                    query.add_virtual_edge(from, to, split(&edge, f_from, f_to));
                }
            }
            if let Some(edge) = self.graph.find_original_edge(high, low) {
                // fractions measured from `high`
                for pair in chain.windows(2) {
                    let (to, f_to) = pair[0];
                    let (from, f_from) = pair[1];
                    query.add_virtual_edge(from, to, split(&edge, 1.0 - f_from, 1.0 - f_to));
                }
            }
            query.hidden.insert((low, high));
        }

        tracing::debug!(
            virtual_nodes = query.n_virtual,
            split_edges = query.hidden.len(),
            "query graph built"
        );
        query
    }
}

/// Costs of the part of `edge` between two positions measured from its tail
fn split(edge: &ChEdge, from: f64, to: f64) -> ChEdge {
    let time_at = |f: f64| (edge.time as f64 * f).round() as u64;
    ChEdge {
        adj: edge.adj,
        weight: edge.weight * to - edge.weight * from,
        // rounding at cumulative positions keeps the parts summing to the whole
        time: time_at(to).saturating_sub(time_at(from)),
        distance: edge.distance * to - edge.distance * from,
        shortcut: false,
    }
}

/// Leveled graph plus the virtual nodes of one request
#[derive(Debug, Clone)]
pub struct QueryGraph<'a> {
    base: &'a ChGraph,
    n_virtual: usize,
    virtual_forward: FxHashMap<NodeId, Vec<ChEdge>>,
    virtual_backward: FxHashMap<NodeId, Vec<ChEdge>>,
    /// Original edges replaced by a virtual chain, keyed `(low, high)`
    hidden: FxHashSet<(NodeId, NodeId)>,
}

impl<'a> QueryGraph<'a> {
    /// Query graph without virtual nodes
    pub fn new(base: &'a ChGraph) -> Self {
        Self {
            base,
            n_virtual: 0,
            virtual_forward: FxHashMap::default(),
            virtual_backward: FxHashMap::default(),
            hidden: FxHashSet::default(),
        }
    }

    pub fn base(&self) -> &'a ChGraph {
        self.base
    }

    pub fn n_virtual_nodes(&self) -> usize {
        self.n_virtual
    }

    fn add_virtual_edge(&mut self, from: NodeId, to: NodeId, costs: ChEdge) {
        self.virtual_forward
            .entry(from)
            .or_default()
            .push(ChEdge { adj: to, ..costs });
        self.virtual_backward
            .entry(to)
            .or_default()
            .push(ChEdge { adj: from, ..costs });
    }

    fn virtual_edges(&self, node: NodeId, dir: Direction) -> &[ChEdge] {
        let table = match dir {
            Direction::Forward => &self.virtual_forward,
            Direction::Backward => &self.virtual_backward,
        };
        table.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    fn is_hidden(&self, a: NodeId, b: NodeId) -> bool {
        !self.hidden.is_empty() && self.hidden.contains(&(a.min(b), a.max(b)))
    }
}

impl RoutingChGraph for QueryGraph<'_> {
    fn base_node_count(&self) -> usize {
        self.base.n_nodes()
    }

    fn node_count(&self) -> usize {
        self.base.n_nodes() + self.n_virtual
    }

    fn level(&self, node: NodeId) -> u32 {
        if self.is_virtual(node) {
            0
        } else {
            self.base.level(node)
        }
    }

    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = ChEdge> + '_ {
        let real: &[ChEdge] = if self.is_virtual(node) {
            &[]
        } else {
            self.base.adjacency(dir).edges_of(node)
        };
        real.iter()
            .copied()
            .filter(move |e| e.shortcut || !self.is_hidden(node, e.adj))
            .chain(self.virtual_edges(node, dir).iter().copied())
    }

    fn base_edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = ChEdge> + '_ {
        let real: &[ChEdge] = if self.is_virtual(node) {
            &[]
        } else {
            self.base.adjacency(dir).edges_of(node)
        };
        real.iter().copied()
    }
}
