//! End-to-end checks of the SBI calculator against the Dijkstra reference

mod common;

use common::{contract, node_snaps, random_ch_graph, random_nodes, TestEdge};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sbi_common::Error;
use sbi_matrix::graph::NodeId;
use sbi_matrix::matrix::{
    calc_matrix, DijkstraOneToMany, ManyToManySbi, TIME_NO_PATH, TIME_SNAP_ERROR,
};
use sbi_matrix::{
    ChGraph, DistanceMatrix, MatrixCalculator, MatrixCell, MatrixConfig, MatrixSnapResult,
    QueryGraph, QueryGraphBuilder, RoutingChGraph, Snap,
};

fn dijkstra<G: RoutingChGraph>(
    graph: &G,
    origins: &MatrixSnapResult,
    destinations: &MatrixSnapResult,
) -> DistanceMatrix {
    DijkstraOneToMany::new(graph, &MatrixConfig::default())
        .calc_matrix(origins, destinations)
        .unwrap()
}

fn assert_same_matrix(sbi: &DistanceMatrix, reference: &DistanceMatrix, context: &str) {
    assert_eq!(sbi.number_of_origins(), reference.number_of_origins());
    assert_eq!(sbi.number_of_destinations(), reference.number_of_destinations());
    for o in 0..sbi.number_of_origins() {
        for d in 0..sbi.number_of_destinations() {
            assert_eq!(
                sbi.cell(o, d),
                reference.cell(o, d),
                "{context}: cell ({o}, {d}) differs"
            );
        }
    }
}

#[test]
fn test_chain_scenario() {
    // A -> B (1), B -> C (1), A -> C (5), D isolated; contract D, A, B, C
    let edges = [
        TestEdge::new(0, 1, 1.0),
        TestEdge::new(1, 2, 1.0),
        TestEdge::new(0, 2, 5.0),
    ];
    let graph = contract(4, &edges, &[3, 0, 1, 2]);

    let matrix = calc_matrix(
        &graph,
        &node_snaps(&[0]),
        &node_snaps(&[1, 2]),
        &MatrixConfig::default(),
    )
    .unwrap();
    assert_eq!(matrix.distance(0, 0), 1.0);
    assert_eq!(matrix.distance(0, 1), 2.0);
}

#[test]
fn test_random_graphs_match_dijkstra() {
    for seed in 0..25 {
        let (graph, _) = random_ch_graph(seed, 40, 90);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xA5A5);
        let origins = node_snaps(&random_nodes(&mut rng, 40, 8));
        let destinations = node_snaps(&random_nodes(&mut rng, 40, 11));

        let sbi = calc_matrix(&graph, &origins, &destinations, &MatrixConfig::default()).unwrap();
        let reference = dijkstra(&graph, &origins, &destinations);
        assert_same_matrix(&sbi, &reference, &format!("seed {seed}"));
    }
}

/// A real node or a quarter position on a random input edge
fn pick_point(
    rng: &mut StdRng,
    builder: &mut QueryGraphBuilder<'_>,
    edges: &[TestEdge],
    n_nodes: u32,
) -> Snap {
    const FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];
    if rng.random_range(0..3) == 0 {
        builder.snap_node(rng.random_range(0..n_nodes)).unwrap()
    } else {
        let edge = edges[rng.random_range(0..edges.len())];
        let fraction = FRACTIONS[rng.random_range(0..FRACTIONS.len())];
        builder.snap_edge(edge.from, edge.to, fraction).unwrap()
    }
}

#[test]
fn test_random_virtual_points_match_dijkstra() {
    for seed in 100..120 {
        let (graph, edges) = random_ch_graph(seed, 30, 70);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut builder = QueryGraphBuilder::new(&graph);

        let origins: Vec<_> = (0..6)
            .map(|_| Some(pick_point(&mut rng, &mut builder, &edges, 30)))
            .collect();
        let destinations: Vec<_> = (0..6)
            .map(|_| Some(pick_point(&mut rng, &mut builder, &edges, 30)))
            .collect();
        let query = builder.build();

        let origins = MatrixSnapResult::from_lookups(origins);
        let destinations = MatrixSnapResult::from_lookups(destinations);
        let sbi = calc_matrix(&query, &origins, &destinations, &MatrixConfig::default()).unwrap();
        let reference = dijkstra(&query, &origins, &destinations);
        assert_same_matrix(&sbi, &reference, &format!("seed {seed}"));
    }
}

/// Splitting an edge with a virtual node matches a graph where the split
/// point is a real node
#[test]
fn test_virtual_node_matches_materialized_split() {
    // 0 <-> 1 (8), 1 <-> 2 (4), 2 -> 0 (20)
    let edges = [
        TestEdge::new(0, 1, 8.0),
        TestEdge::new(1, 0, 8.0),
        TestEdge::new(1, 2, 4.0),
        TestEdge::new(2, 1, 4.0),
        TestEdge::new(2, 0, 20.0),
    ];
    let graph = contract(3, &edges, &[0, 2, 1]);
    let mut builder = QueryGraphBuilder::new(&graph);
    let virtual_point = builder.snap_edge(0, 1, 0.25).unwrap();
    let query = builder.build();

    // node 3 sits 2 away from 0 and 6 away from 1
    let split_edges = [
        TestEdge::new(0, 3, 2.0),
        TestEdge::new(3, 0, 2.0),
        TestEdge::new(3, 1, 6.0),
        TestEdge::new(1, 3, 6.0),
        TestEdge::new(1, 2, 4.0),
        TestEdge::new(2, 1, 4.0),
        TestEdge::new(2, 0, 20.0),
    ];
    let split = contract(4, &split_edges, &[3, 0, 2, 1]);

    let virtual_snaps = MatrixSnapResult::from_lookups([
        Some(virtual_point),
        Some(Snap::new(0)),
        Some(Snap::new(2)),
    ]);
    let split_snaps = node_snaps(&[3, 0, 2]);

    let config = MatrixConfig::default();
    let on_query = calc_matrix(&query, &virtual_snaps, &virtual_snaps, &config).unwrap();
    let on_split = calc_matrix(&split, &split_snaps, &split_snaps, &config).unwrap();
    assert_same_matrix(&on_query, &on_split, "virtual vs split");
    // v -> 1 -> 2 and 2 -> 1 -> v -> 0
    assert_eq!(on_query.distance(0, 2), 10.0);
    assert_eq!(on_query.distance(2, 1), 12.0);
    assert_eq!(on_query.time(2, 1), 12_000);
}

#[test]
fn test_unsnapped_points_and_sentinels() {
    let (graph, _) = random_ch_graph(7, 20, 40);
    let origins = MatrixSnapResult::from_lookups([Some(Snap::new(0)), None, Some(Snap::new(5))]);
    let destinations =
        MatrixSnapResult::from_lookups([Some(Snap::new(3)), Some(Snap::new(4)), None]);
    let matrix = calc_matrix(&graph, &origins, &destinations, &MatrixConfig::default()).unwrap();

    for d in 0..3 {
        assert_eq!(matrix.time(1, d), TIME_SNAP_ERROR);
    }
    for o in 0..3 {
        assert_eq!(matrix.cell(o, 2), MatrixCell::SnapError);
    }
    for (o, d) in [(0, 0), (0, 1), (2, 0), (2, 1)] {
        assert_ne!(matrix.cell(o, d), MatrixCell::SnapError);
        if matrix.time(o, d) == TIME_NO_PATH {
            assert_eq!(matrix.cell(o, d), MatrixCell::Unreachable);
        }
    }
}

#[test]
fn test_one_shot_and_fresh_instances() {
    let (graph, _) = random_ch_graph(3, 25, 60);
    let origins = node_snaps(&[0, 1, 2, 3]);
    let destinations = node_snaps(&[4, 5, 6, 0]);

    let mut first = ManyToManySbi::new(&graph, &MatrixConfig::default());
    let a = first.calc_matrix(&origins, &destinations).unwrap();
    assert!(matches!(
        first.calc_matrix(&origins, &destinations),
        Err(Error::AlreadyRun)
    ));

    let mut second = ManyToManySbi::new(&graph, &MatrixConfig::default());
    let b = second.calc_matrix(&origins, &destinations).unwrap();
    assert_eq!(a, b);
    assert_eq!(first.visited_nodes(), second.visited_nodes());
}

#[test]
fn test_visited_node_limit_aborts() {
    let (graph, _) = random_ch_graph(11, 40, 100);
    let origins = node_snaps(&[0, 1, 2]);
    let destinations = node_snaps(&[3, 4, 5]);

    let mut unlimited = ManyToManySbi::new(&graph, &MatrixConfig::default());
    unlimited.calc_matrix(&origins, &destinations).unwrap();
    let visited = unlimited.visited_nodes();
    assert!(visited > 1);

    let exact = MatrixConfig::default().with_max_visited_nodes(visited);
    assert!(calc_matrix(&graph, &origins, &destinations, &exact).is_ok());

    let tight = MatrixConfig::default().with_max_visited_nodes(visited - 1);
    assert!(matches!(
        calc_matrix(&graph, &origins, &destinations, &tight),
        Err(Error::MaxVisitedNodesExceeded { .. })
    ));
}

#[test]
fn test_identical_origins_and_destinations_give_zero_diagonal() {
    let (graph, _) = random_ch_graph(21, 30, 80);
    let nodes: Vec<NodeId> = vec![2, 9, 9, 17];
    let snaps = node_snaps(&nodes);
    let matrix = calc_matrix(&graph, &snaps, &snaps, &MatrixConfig::default()).unwrap();
    for i in 0..nodes.len() {
        assert_eq!(
            matrix.cell(i, i),
            MatrixCell::Path {
                distance: 0.0,
                time: 0
            }
        );
    }
    assert_eq!(matrix.cell(1, 2), MatrixCell::Path { distance: 0.0, time: 0 });
}

#[test]
fn test_query_graph_without_virtual_nodes_behaves_like_base() {
    let (graph, _): (ChGraph, _) = random_ch_graph(5, 30, 70);
    let query = QueryGraph::new(&graph);
    let origins = node_snaps(&[0, 10, 20]);
    let destinations = node_snaps(&[5, 15, 25]);

    let on_base = calc_matrix(&graph, &origins, &destinations, &MatrixConfig::default()).unwrap();
    let on_query = calc_matrix(&query, &origins, &destinations, &MatrixConfig::default()).unwrap();
    assert_eq!(on_base, on_query);
}

#[test]
fn test_not_found_origin_row() {
    // A -> B (1), B -> C (1), A -> C (5)
    let edges = [
        TestEdge::new(0, 1, 1.0),
        TestEdge::new(1, 2, 1.0),
        TestEdge::new(0, 2, 5.0),
    ];
    let graph = contract(3, &edges, &[0, 1, 2]);
    let origins = MatrixSnapResult::from_lookups([Some(Snap::new(0)), None]);
    let destinations = node_snaps(&[1]);

    let matrix = calc_matrix(&graph, &origins, &destinations, &MatrixConfig::default()).unwrap();
    assert_eq!(
        matrix.cell(0, 0),
        MatrixCell::Path {
            distance: 1.0,
            time: 1000
        }
    );
    assert_eq!(matrix.cell(1, 0), MatrixCell::SnapError);
}
