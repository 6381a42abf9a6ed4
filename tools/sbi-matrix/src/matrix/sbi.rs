//! Many-to-many matrix with Simultaneous Bucket Initialization (SBI)
//!
//! Unlike the classic bucket algorithm, which runs one upward search per
//! source, all origins (or all destinations) are seeded into a single shared
//! search that settles nodes in ascending hierarchy level:
//!
//! 1. Backward sweep: seed every destination, propagate buckets upward along
//!    incoming edges. Each node ends with the best known paths to destinations.
//! 2. Forward sweep: seed every origin, propagate upward along outgoing edges.
//!    Whenever a forward bucket meets a backward bucket at the same node the
//!    combined path is checked against the best known route for that pair.
//!
//! When a node is settled it pulls buckets from every already-settled lower
//! neighbor (down edges). It then prunes buckets of lower neighbors that are
//! dominated by a detour through itself (up edges, retrospective pruning).
//! Seeds on virtual nodes are spread to their real neighbors with a small BFS
//! before the sweep starts, since virtual nodes are not part of the hierarchy.

use std::collections::{BinaryHeap, VecDeque};
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use sbi_common::{Error, Result};

use super::bucket::{Bucket, BucketTable, DownEdge, RankedNode, UpEdge};
use super::pairing::pair;
use super::{DistanceMatrix, MatrixCalculator, MatrixSnapResult};
use crate::config::MatrixConfig;
use crate::graph::{accept_hierarchy_edge, ChEdge, Direction, NodeId, RoutingChGraph};

/// Which half of the computation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Backward,
    Forward,
}

impl Sweep {
    /// Direction along which buckets travel towards higher levels
    fn down_direction(self) -> Direction {
        match self {
            Sweep::Backward => Direction::Backward,
            Sweep::Forward => Direction::Forward,
        }
    }

    fn up_direction(self) -> Direction {
        self.down_direction().reverse()
    }
}

/// Initial table capacity derived from the graph size
fn table_capacity(n_nodes: usize) -> usize {
    (n_nodes / 10).clamp(200, 150_000)
}

/// SBI matrix calculator; one instance per matrix
pub struct ManyToManySbi<'a, G: RoutingChGraph> {
    graph: &'a G,
    max_visited_nodes: Option<usize>,
    already_run: bool,
    visited_nodes: usize,

    heap: BinaryHeap<RankedNode>,
    traversed: FxHashSet<NodeId>,
    down_edges: FxHashMap<NodeId, Vec<DownEdge>>,
    up_edges: FxHashMap<NodeId, Vec<UpEdge>>,

    backward_buckets: FxHashMap<NodeId, BucketTable>,
    forward_buckets: FxHashMap<NodeId, BucketTable>,
    /// Best weight per `pair(origin, destination)`
    short_routes: FxHashMap<u64, f64>,

    debug: String,
}

impl<'a, G: RoutingChGraph> ManyToManySbi<'a, G> {
    pub fn new(graph: &'a G, config: &MatrixConfig) -> Self {
        let capacity = table_capacity(graph.node_count());
        Self {
            graph,
            max_visited_nodes: config.max_visited_nodes,
            already_run: false,
            visited_nodes: 0,
            heap: BinaryHeap::with_capacity(capacity),
            traversed: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
            down_edges: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            up_edges: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            backward_buckets: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            forward_buckets: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            short_routes: FxHashMap::default(),
            debug: String::new(),
        }
    }

    fn buckets(&self, sweep: Sweep) -> &FxHashMap<NodeId, BucketTable> {
        match sweep {
            Sweep::Backward => &self.backward_buckets,
            Sweep::Forward => &self.forward_buckets,
        }
    }

    fn buckets_mut(&mut self, sweep: Sweep) -> &mut FxHashMap<NodeId, BucketTable> {
        match sweep {
            Sweep::Backward => &mut self.backward_buckets,
            Sweep::Forward => &mut self.forward_buckets,
        }
    }

    // =========================================================================
    // SEEDING
    // =========================================================================

    fn seed_points(
        &mut self,
        sweep: Sweep,
        points: &MatrixSnapResult,
        matrix: &mut DistanceMatrix,
    ) {
        for (idx, snap) in points.found() {
            let point = idx as u32;
            let node = snap.closest_node;

            if sweep == Sweep::Forward {
                self.discover_initial_short_paths(point, node, matrix);
            }

            if self.graph.is_virtual(node) {
                self.seed_virtual_node(sweep, node, point);
            } else if self.traversed.insert(node) {
                let no_accessible = self.has_no_accessible_neighbor(sweep, node);
                let level = self.graph.level(node);
                self.heap.push(RankedNode::seed(node, level, no_accessible));
                self.add_seed_bucket(sweep, node, point);
            } else {
                // shared seed node, or a node already reached from a virtual seed
                self.add_seed_bucket(sweep, node, point);
            }
        }
    }

    fn add_seed_bucket(&mut self, sweep: Sweep, node: NodeId, point: u32) {
        self.buckets_mut(sweep)
            .entry(node)
            .or_default()
            .offer(Bucket::seed(point));
    }

    /// True when no edge of the seed passes the hierarchy filter towards a
    /// real, accessible neighbor
    fn has_no_accessible_neighbor(&self, sweep: Sweep, node: NodeId) -> bool {
        let graph = self.graph;
        !graph.edges(node, sweep.down_direction()).any(|edge| {
            edge.is_accessible()
                && !graph.is_virtual(edge.adj)
                && accept_hierarchy_edge(graph, node, &edge)
        })
    }

    /// Spread a seed on a virtual node to the real nodes around it.
    ///
    /// Walks the query view through connected virtual nodes, records down
    /// edges for every accessible edge, queues the real neighbors and merges
    /// buckets into intermediate virtual nodes as they are reached.
    fn seed_virtual_node(&mut self, sweep: Sweep, virtual_node: NodeId, point: u32) {
        let graph = self.graph;
        let dir = sweep.down_direction();
        self.add_seed_bucket(sweep, virtual_node, point);

        let mut processed = FxHashSet::default();
        let mut queue = VecDeque::from([virtual_node]);

        while let Some(current) = queue.pop_front() {
            for edge in graph.edges(current, dir) {
                if !edge.is_accessible() {
                    continue;
                }
                self.add_down_edge(current, &edge);

                if edge.adj == virtual_node || processed.contains(&edge.adj) {
                    continue;
                }
                if graph.is_virtual(edge.adj) {
                    processed.insert(edge.adj);
                    queue.push_back(edge.adj);
                } else if self.traversed.insert(edge.adj) {
                    self.heap.push(RankedNode::new(edge.adj, graph.level(edge.adj)));
                }
            }

            if current != virtual_node {
                let mut table = self
                    .buckets_mut(sweep)
                    .remove(&current)
                    .unwrap_or_default();
                self.merge_down_edges(sweep, current, &mut table);
                if !table.is_empty() {
                    self.buckets_mut(sweep).insert(current, table);
                }
            }
        }

        tracing::trace!(
            virtual_node,
            point,
            reached_virtual = processed.len(),
            "virtual seed spread"
        );
    }

    // =========================================================================
    // PROPAGATION
    // =========================================================================

    fn propagate(&mut self, sweep: Sweep, matrix: &mut DistanceMatrix) -> Result<()> {
        while let Some(current) = self.heap.pop() {
            self.visited_nodes += 1;
            if let Some(limit) = self.max_visited_nodes {
                if self.visited_nodes > limit {
                    tracing::debug!(limit, ?sweep, "visited node limit reached");
                    return Err(Error::MaxVisitedNodesExceeded { limit });
                }
            }

            self.collect_down_edges(sweep, &current);
            self.collect_up_edges(sweep, current.node);

            let mut table = self
                .buckets_mut(sweep)
                .remove(&current.node)
                .unwrap_or_default();
            self.merge_down_edges(sweep, current.node, &mut table);
            self.retrospective_pruning(sweep, current.node, &table);
            if sweep == Sweep::Forward {
                self.discover_short_paths(current.node, &table, matrix);
            }
            if !table.is_empty() {
                self.buckets_mut(sweep).insert(current.node, table);
            }
        }
        Ok(())
    }

    /// Queue the neighbors that will later pull buckets from `current`
    fn collect_down_edges(&mut self, sweep: Sweep, current: &RankedNode) {
        let graph = self.graph;
        for edge in graph.base_edges(current.node, sweep.down_direction()) {
            if !current.no_accessible_neighbor
                && !accept_hierarchy_edge(graph, current.node, &edge)
            {
                continue;
            }
            if !edge.is_accessible() {
                continue;
            }
            if self.traversed.insert(edge.adj) {
                self.heap.push(RankedNode::new(edge.adj, graph.level(edge.adj)));
            }
            self.add_down_edge(current.node, &edge);
        }
    }

    /// Register `current` as a possible detour for its upper neighbors
    fn collect_up_edges(&mut self, sweep: Sweep, current: NodeId) {
        let graph = self.graph;
        for edge in graph.base_edges(current, sweep.up_direction()) {
            if !accept_hierarchy_edge(graph, current, &edge) || !edge.is_accessible() {
                continue;
            }
            self.up_edges.entry(edge.adj).or_default().push(UpEdge {
                base: current,
                weight: edge.weight,
            });
        }
    }

    fn add_down_edge(&mut self, base: NodeId, edge: &ChEdge) {
        self.down_edges.entry(edge.adj).or_default().push(DownEdge {
            base,
            weight: edge.weight,
            time: edge.time,
            distance: edge.distance,
        });
    }

    /// Pull buckets from all lower neighbors into `table`
    fn merge_down_edges(&self, sweep: Sweep, node: NodeId, table: &mut BucketTable) {
        let Some(down_edges) = self.down_edges.get(&node) else {
            return;
        };
        let buckets = self.buckets(sweep);
        for edge in down_edges {
            if let Some(lower) = buckets.get(&edge.base) {
                for bucket in lower.iter() {
                    table.offer(bucket.extend(edge));
                }
            }
        }
    }

    /// Drop buckets of lower neighbors that a path through `node` beats
    fn retrospective_pruning(&mut self, sweep: Sweep, node: NodeId, table: &BucketTable) {
        let Some(up_edges) = self.up_edges.get(&node) else {
            return;
        };
        let buckets = match sweep {
            Sweep::Backward => &mut self.backward_buckets,
            Sweep::Forward => &mut self.forward_buckets,
        };
        for up in up_edges {
            let emptied = match buckets.get_mut(&up.base) {
                Some(lower) => {
                    lower.retain(|b| {
                        table
                            .get(b.point)
                            .map_or(true, |via| b.weight <= up.weight + via.weight)
                    });
                    lower.is_empty()
                }
                None => false,
            };
            if emptied {
                buckets.remove(&up.base);
            }
        }
    }

    // =========================================================================
    // MEETING POINTS
    // =========================================================================

    fn improves(short_routes: &mut FxHashMap<u64, f64>, key: u64, weight: f64) -> bool {
        let best = short_routes.entry(key).or_insert(f64::INFINITY);
        if weight < *best {
            *best = weight;
            true
        } else {
            false
        }
    }

    /// Origin seeded on a node that already carries backward buckets
    fn discover_initial_short_paths(
        &mut self,
        origin: u32,
        node: NodeId,
        matrix: &mut DistanceMatrix,
    ) {
        let Some(targets) = self.backward_buckets.get(&node) else {
            return;
        };
        for target in targets.iter() {
            let key = pair(origin, target.point);
            if Self::improves(&mut self.short_routes, key, target.weight) {
                matrix.set_cell(
                    origin as usize,
                    target.point as usize,
                    target.distance,
                    target.time,
                );
            }
        }
    }

    fn discover_short_paths(
        &mut self,
        node: NodeId,
        table: &BucketTable,
        matrix: &mut DistanceMatrix,
    ) {
        let Some(targets) = self.backward_buckets.get(&node) else {
            return;
        };
        for target in targets.iter() {
            for source in table.iter() {
                let weight = source.weight + target.weight;
                let key = pair(source.point, target.point);
                if Self::improves(&mut self.short_routes, key, weight) {
                    matrix.set_cell(
                        source.point as usize,
                        target.point as usize,
                        source.distance + target.distance,
                        source.time.saturating_add(target.time),
                    );
                }
            }
        }
    }

    /// Clear sweep state but keep the backward buckets
    fn reset_for_forward(&mut self) {
        self.heap.clear();
        self.traversed.clear();
        self.down_edges.clear();
        self.up_edges.clear();
    }
}

impl<G: RoutingChGraph> MatrixCalculator for ManyToManySbi<'_, G> {
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

        self.seed_points(Sweep::Backward, destinations, &mut matrix);
        self.propagate(Sweep::Backward, &mut matrix)?;
        let backward_time = start.elapsed();
        let backward_visited = self.visited_nodes;
        tracing::debug!(
            destinations = destinations.size(),
            visited = backward_visited,
            tables = self.backward_buckets.len(),
            ms = backward_time.as_millis() as u64,
            "backward sweep finished"
        );

        self.reset_for_forward();

        self.seed_points(Sweep::Forward, origins, &mut matrix);
        self.propagate(Sweep::Forward, &mut matrix)?;
        let total_time = start.elapsed();
        tracing::debug!(
            origins = origins.size(),
            visited = self.visited_nodes - backward_visited,
            routes = self.short_routes.len(),
            ms = (total_time - backward_time).as_millis() as u64,
            "forward sweep finished"
        );

        self.debug = format!(
            "{}: backward {} ms, forward {} ms, visited {}",
            self.name(),
            backward_time.as_millis(),
            (total_time - backward_time).as_millis(),
            self.visited_nodes
        );
        Ok(matrix)
    }

    fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    fn name(&self) -> &'static str {
        "many_to_many_sbi"
    }

    fn debug_string(&self) -> String {
        self.debug.clone()
    }
}

/// Compute one matrix with a fresh SBI calculator
pub fn calc_matrix<G: RoutingChGraph>(
    graph: &G,
    origins: &MatrixSnapResult,
    destinations: &MatrixSnapResult,
    config: &MatrixConfig,
) -> Result<DistanceMatrix> {
    ManyToManySbi::new(graph, config).calc_matrix(origins, destinations)
}
