//! One-to-many Dijkstra fallback
//!
//! Runs a plain Dijkstra per origin over the original (non-shortcut) edges of
//! the query graph and stops once every destination node is settled. Much
//! slower than SBI on large graphs, but needs no hierarchy and serves as the
//! reference for correctness checks.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use sbi_common::{Error, Result};

use super::{DistanceMatrix, MatrixCalculator, MatrixSnapResult};
use crate::config::MatrixConfig;
use crate::graph::{Direction, NodeId, RoutingChGraph};

#[derive(Debug, Clone, Copy)]
struct Label {
    weight: f64,
    time: u64,
    distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    weight: f64,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on weight, ties by node id
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Dijkstra-based matrix calculator; one instance per matrix
pub struct DijkstraOneToMany<'a, G: RoutingChGraph> {
    graph: &'a G,
    max_visited_nodes: Option<usize>,
    already_run: bool,
    visited_nodes: usize,
    debug: String,
}

impl<'a, G: RoutingChGraph> DijkstraOneToMany<'a, G> {
    pub fn new(graph: &'a G, config: &MatrixConfig) -> Self {
        Self {
            graph,
            max_visited_nodes: config.max_visited_nodes,
            already_run: false,
            visited_nodes: 0,
            debug: String::new(),
        }
    }

    /// Settled labels from `source` until all of `targets` are settled
    fn search(
        &mut self,
        source: NodeId,
        targets: &FxHashSet<NodeId>,
    ) -> Result<FxHashMap<NodeId, Label>> {
        let mut labels: FxHashMap<NodeId, Label> = FxHashMap::default();
        let mut settled: FxHashMap<NodeId, Label> = FxHashMap::default();
        let mut heap = BinaryHeap::new();
        let mut remaining = targets.len();

        labels.insert(
            source,
            Label {
                weight: 0.0,
                time: 0,
                distance: 0.0,
            },
        );
        heap.push(QueueEntry {
            weight: 0.0,
            node: source,
        });

        while let Some(QueueEntry { weight, node }) = heap.pop() {
            if settled.contains_key(&node) {
                continue;
            }
            let Some(&label) = labels.get(&node) else {
                continue;
            };
            if weight > label.weight {
                continue;
            }

            self.visited_nodes += 1;
            if let Some(limit) = self.max_visited_nodes {
                if self.visited_nodes > limit {
                    return Err(Error::MaxVisitedNodesExceeded { limit });
                }
            }
            settled.insert(node, label);
            if targets.contains(&node) {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }

            for edge in self.graph.edges(node, Direction::Forward) {
                if edge.shortcut || !edge.is_accessible() || settled.contains_key(&edge.adj) {
                    continue;
                }
                let candidate = Label {
                    weight: label.weight + edge.weight,
                    time: label.time.saturating_add(edge.time),
                    distance: label.distance + edge.distance,
                };
                let better = labels
                    .get(&edge.adj)
                    .map_or(true, |known| candidate.weight < known.weight);
                if better {
                    labels.insert(edge.adj, candidate);
                    heap.push(QueueEntry {
                        weight: candidate.weight,
                        node: edge.adj,
                    });
                }
            }
        }

        Ok(settled)
    }
}

impl<G: RoutingChGraph> MatrixCalculator for DijkstraOneToMany<'_, G> {
    fn calc_matrix(
        &mut self,
        origins: &MatrixSnapResult,
        destinations: &MatrixSnapResult,
    ) -> Result<DistanceMatrix> {
        if self.already_run {
            return Err(Error::AlreadyRun);
        }
        origins.check_nodes(self.graph.node_count())?;
        destinations.check_nodes(self.graph.node_count())?;
        self.already_run = true;

        let start = Instant::now();
        let mut matrix = DistanceMatrix::new(
            origins.size(),
            destinations.size(),
            origins.points_not_found(),
            destinations.points_not_found(),
        );

        let targets: FxHashSet<NodeId> = destinations
            .found()
            .map(|(_, snap)| snap.closest_node)
            .collect();

        for (origin, snap) in origins.found() {
            let settled = self.search(snap.closest_node, &targets)?;
            for (destination, target) in destinations.found() {
                if let Some(label) = settled.get(&target.closest_node) {
                    matrix.set_cell(origin, destination, label.distance, label.time);
                }
            }
        }

        self.debug = format!(
            "{}: {} ms, visited {}",
            self.name(),
            start.elapsed().as_millis(),
            self.visited_nodes
        );
        tracing::debug!(visited = self.visited_nodes, "dijkstra matrix finished");
        Ok(matrix)
    }

    fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    fn name(&self) -> &'static str {
        "dijkstra_one_to_many"
    }

    fn debug_string(&self) -> String {
        self.debug.clone()
    }
}
