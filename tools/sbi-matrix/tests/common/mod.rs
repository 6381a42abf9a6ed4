//! Shared helpers for integration tests: a naive contractor and random graphs

#![allow(dead_code)]

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sbi_matrix::graph::NodeId;
use sbi_matrix::{ChGraph, ChGraphBuilder, MatrixSnapResult, Snap};

/// Directed input edge; distance equals weight and time is weight in ms
#[derive(Debug, Clone, Copy)]
pub struct TestEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

impl TestEdge {
    pub fn new(from: NodeId, to: NodeId, weight: f64) -> Self {
        Self { from, to, weight }
    }
}

fn time_of(weight: f64) -> u64 {
    (weight * 1000.0).round() as u64
}

/// Contract nodes in `order` (first = lowest level) without witness search.
///
/// Every path `u -> v -> x` through a contracted node `v` gets a shortcut
/// `u -> x` unless an equal or lighter edge already connects them, which
/// keeps the hierarchy exact at the cost of extra shortcuts.
pub fn contract(n_nodes: usize, edges: &[TestEdge], order: &[NodeId]) -> ChGraph {
    let mut levels = vec![0u32; n_nodes];
    for (level, &node) in order.iter().enumerate() {
        levels[node as usize] = level as u32;
    }

    let mut outgoing: Vec<BTreeMap<NodeId, f64>> = vec![BTreeMap::new(); n_nodes];
    let mut incoming: Vec<BTreeMap<NodeId, f64>> = vec![BTreeMap::new(); n_nodes];
    for e in edges.iter().filter(|e| e.weight.is_finite()) {
        let best = outgoing[e.from as usize].entry(e.to).or_insert(f64::INFINITY);
        if e.weight < *best {
            *best = e.weight;
            incoming[e.to as usize].insert(e.from, e.weight);
        }
    }

    let mut contracted = vec![false; n_nodes];
    let mut shortcuts: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
    for &v in order {
        let ins: Vec<(NodeId, f64)> = incoming[v as usize]
            .iter()
            .filter(|(u, _)| !contracted[**u as usize])
            .map(|(u, w)| (*u, *w))
            .collect();
        let outs: Vec<(NodeId, f64)> = outgoing[v as usize]
            .iter()
            .filter(|(x, _)| !contracted[**x as usize])
            .map(|(x, w)| (*x, *w))
            .collect();

        for &(u, w_in) in &ins {
            for &(x, w_out) in &outs {
                if u == x {
                    continue;
                }
                let candidate = w_in + w_out;
                let known = outgoing[u as usize].get(&x).copied().unwrap_or(f64::INFINITY);
                if candidate < known {
                    outgoing[u as usize].insert(x, candidate);
                    incoming[x as usize].insert(u, candidate);
                    shortcuts.insert((u, x), candidate);
                }
            }
        }
        contracted[v as usize] = true;
    }

    let mut builder = ChGraphBuilder::new(levels);
    for e in edges {
        builder
            .add_edge(e.from, e.to, e.weight, time_of(e.weight), e.weight)
            .unwrap();
    }
    for ((u, x), weight) in shortcuts {
        builder
            .add_shortcut(u, x, weight, time_of(weight), weight)
            .unwrap();
    }
    builder.build()
}

/// Random sparse graph with integer weights; about a third of the edges are
/// two-way
pub fn random_edges(rng: &mut StdRng, n_nodes: usize, n_edges: usize) -> Vec<TestEdge> {
    let mut edges = Vec::with_capacity(n_edges * 2);
    while edges.len() < n_edges {
        let from = rng.random_range(0..n_nodes) as NodeId;
        let to = rng.random_range(0..n_nodes) as NodeId;
        if from == to {
            continue;
        }
        let weight = rng.random_range(1..=20) as f64;
        edges.push(TestEdge { from, to, weight });
        if rng.random_range(0..3) == 0 {
            edges.push(TestEdge {
                from: to,
                to: from,
                weight,
            });
        }
    }
    edges
}

/// Random graph contracted in a random order
pub fn random_ch_graph(seed: u64, n_nodes: usize, n_edges: usize) -> (ChGraph, Vec<TestEdge>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let edges = random_edges(&mut rng, n_nodes, n_edges);
    let mut order: Vec<NodeId> = (0..n_nodes as NodeId).collect();
    order.shuffle(&mut rng);
    (contract(n_nodes, &edges, &order), edges)
}

pub fn random_nodes(rng: &mut StdRng, n_nodes: usize, count: usize) -> Vec<NodeId> {
    (0..count)
        .map(|_| rng.random_range(0..n_nodes) as NodeId)
        .collect()
}

pub fn node_snaps(nodes: &[NodeId]) -> MatrixSnapResult {
    MatrixSnapResult::from_lookups(nodes.iter().map(|&n| Some(Snap::new(n))))
}
