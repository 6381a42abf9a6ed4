//! Preprocessed Contraction Hierarchy stored as flat CSR adjacency
//!
//! Original edges are stored twice: in the forward list of their tail and in
//! the backward list of their head. Shortcuts are stored once per direction,
//! at their lower-level endpoint only, so every search that follows a shortcut
//! starts below it.

use sbi_common::{Error, Result};
use serde::{Deserialize, Serialize};

use super::{ChEdge, Direction, NodeId, RoutingChGraph};

// =============================================================================
// FLAT ADJACENCY
// =============================================================================

/// Flat adjacency lists with embedded edge costs
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    offsets: Vec<u64>, // n_nodes + 1
    edges: Vec<ChEdge>,
}

impl Adjacency {
    /// Build from `(owner, edge)` pairs, keeping insertion order per owner
    fn build(n_nodes: usize, entries: &[(NodeId, ChEdge)]) -> Self {
        // First pass: count edges per node
        let mut counts = vec![0usize; n_nodes];
        for (owner, _) in entries {
            counts[*owner as usize] += 1;
        }

        // Build offsets (prefix sum)
        let mut offsets = Vec::with_capacity(n_nodes + 1);
        let mut offset = 0u64;
        for &count in &counts {
            offsets.push(offset);
            offset += count as u64;
        }
        offsets.push(offset);

        // Second pass: fill
        let placeholder = ChEdge {
            adj: 0,
            weight: 0.0,
            time: 0,
            distance: 0.0,
            shortcut: false,
        };
        let mut edges = vec![placeholder; offset as usize];
        counts.fill(0);
        for (owner, edge) in entries {
            let owner = *owner as usize;
            let pos = offsets[owner] as usize + counts[owner];
            edges[pos] = *edge;
            counts[owner] += 1;
        }

        Self { offsets, edges }
    }

    #[inline]
    pub fn edges_of(&self, node: NodeId) -> &[ChEdge] {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        &self.edges[start..end]
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// A directed edge as ingested, before it is split into adjacency lists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    pub time: u64,
    pub distance: f64,
    pub shortcut: bool,
}

/// Immutable leveled graph with forward and backward adjacency
#[derive(Debug, Clone)]
pub struct ChGraph {
    levels: Vec<u32>,
    forward: Adjacency,
    backward: Adjacency,
    n_original: usize,
    n_shortcuts: usize,
}

impl ChGraph {
    pub fn n_nodes(&self) -> usize {
        self.levels.len()
    }

    /// Number of original (non-shortcut) directed edges
    pub fn n_original_edges(&self) -> usize {
        self.n_original
    }

    pub fn n_shortcuts(&self) -> usize {
        self.n_shortcuts
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn adjacency(&self, dir: Direction) -> &Adjacency {
        match dir {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn check_node(&self, node: NodeId) -> Result<()> {
        if (node as usize) < self.n_nodes() {
            Ok(())
        } else {
            Err(Error::NodeOutOfRange {
                node,
                node_count: self.n_nodes(),
            })
        }
    }

    /// Cheapest original edge `from -> to`, if any
    pub fn find_original_edge(&self, from: NodeId, to: NodeId) -> Option<ChEdge> {
        if self.check_node(from).is_err() || self.check_node(to).is_err() {
            return None;
        }
        self.forward
            .edges_of(from)
            .iter()
            .filter(|e| !e.shortcut && e.adj == to)
            .min_by(|a, b| a.weight.total_cmp(&b.weight))
            .copied()
    }

    /// Every stored edge exactly once, in ingestion form
    pub fn edge_records(&self) -> impl Iterator<Item = EdgeRecord> + '_ {
        (0..self.n_nodes() as NodeId).flat_map(move |node| {
            // forward lists hold all originals and the shortcuts leaving a lower node
            let outgoing = self.forward.edges_of(node).iter().map(move |e| EdgeRecord {
                from: node,
                to: e.adj,
                weight: e.weight,
                time: e.time,
                distance: e.distance,
                shortcut: e.shortcut,
            });
            // backward lists add the shortcuts entering a lower node
            let incoming = self
                .backward
                .edges_of(node)
                .iter()
                .filter(|e| e.shortcut)
                .map(move |e| EdgeRecord {
                    from: e.adj,
                    to: node,
                    weight: e.weight,
                    time: e.time,
                    distance: e.distance,
                    shortcut: true,
                });
            outgoing.chain(incoming)
        })
    }
}

impl RoutingChGraph for ChGraph {
    fn base_node_count(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    fn level(&self, node: NodeId) -> u32 {
        self.levels.get(node as usize).copied().unwrap_or(0)
    }

    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = ChEdge> + '_ {
        self.adjacency(dir).edges_of(node).iter().copied()
    }

    fn base_edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = ChEdge> + '_ {
        self.adjacency(dir).edges_of(node).iter().copied()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Validating builder for [`ChGraph`]
///
/// All checks happen on insertion, so a built graph never needs to be
/// validated again inside the search loops.
#[derive(Debug, Clone)]
pub struct ChGraphBuilder {
    levels: Vec<u32>,
    records: Vec<EdgeRecord>,
}

impl ChGraphBuilder {
    /// One level per node; the node count is `levels.len()`
    pub fn new(levels: Vec<u32>) -> Self {
        Self {
            levels,
            records: Vec::new(),
        }
    }

    /// Start from a level table that must match a known node count
    pub fn with_node_count(levels: Vec<u32>, n_nodes: usize) -> Result<Self> {
        if levels.len() != n_nodes {
            return Err(Error::LevelCountMismatch {
                levels: levels.len(),
                nodes: n_nodes,
            });
        }
        Ok(Self::new(levels))
    }

    pub fn n_nodes(&self) -> usize {
        self.levels.len()
    }

    /// Add an original directed edge
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        time: u64,
        distance: f64,
    ) -> Result<&mut Self> {
        self.push(EdgeRecord {
            from,
            to,
            weight,
            time,
            distance,
            shortcut: false,
        })
    }

    /// Add an original edge in both directions with identical costs
    pub fn add_two_way_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: f64,
        time: u64,
        distance: f64,
    ) -> Result<&mut Self> {
        self.add_edge(a, b, weight, time, distance)?;
        self.add_edge(b, a, weight, time, distance)
    }

    /// Add a shortcut produced by contraction
    pub fn add_shortcut(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        time: u64,
        distance: f64,
    ) -> Result<&mut Self> {
        self.push(EdgeRecord {
            from,
            to,
            weight,
            time,
            distance,
            shortcut: true,
        })
    }

    pub fn add_record(&mut self, record: EdgeRecord) -> Result<&mut Self> {
        self.push(record)
    }

    fn push(&mut self, record: EdgeRecord) -> Result<&mut Self> {
        self.validate(&record)?;
        self.records.push(record);
        Ok(self)
    }

    fn validate(&self, record: &EdgeRecord) -> Result<()> {
        let n_nodes = self.levels.len();
        for node in [record.from, record.to] {
            if node as usize >= n_nodes {
                return Err(Error::NodeOutOfRange {
                    node,
                    node_count: n_nodes,
                });
            }
        }

        let reject = |reason: &str| {
            Err(Error::InvalidEdge {
                from: record.from,
                to: record.to,
                reason: reason.to_string(),
            })
        };

        if record.from == record.to {
            return reject("self loops are not allowed");
        }
        if record.weight.is_nan() {
            return reject("weight is NaN");
        }
        // +inf marks an inaccessible direction and is allowed
        if record.weight < 0.0 {
            return reject("weight is negative");
        }
        if !record.distance.is_finite() || record.distance < 0.0 {
            return reject("distance must be finite and non-negative");
        }
        Ok(())
    }

    pub fn build(self) -> ChGraph {
        let n_nodes = self.levels.len();
        let mut forward = Vec::with_capacity(self.records.len());
        let mut backward = Vec::with_capacity(self.records.len());
        let mut n_shortcuts = 0usize;

        for r in &self.records {
            let out_edge = ChEdge {
                adj: r.to,
                weight: r.weight,
                time: r.time,
                distance: r.distance,
                shortcut: r.shortcut,
            };
            let in_edge = ChEdge { adj: r.from, ..out_edge };

            if r.shortcut {
                n_shortcuts += 1;
                if self.levels[r.from as usize] <= self.levels[r.to as usize] {
                    forward.push((r.from, out_edge));
                } else {
                    backward.push((r.to, in_edge));
                }
            } else {
                forward.push((r.from, out_edge));
                backward.push((r.to, in_edge));
            }
        }

        ChGraph {
            forward: Adjacency::build(n_nodes, &forward),
            backward: Adjacency::build(n_nodes, &backward),
            n_original: self.records.len() - n_shortcuts,
            n_shortcuts,
            levels: self.levels,
        }
    }
}
