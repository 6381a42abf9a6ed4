//! JSON matrix requests and responses
//!
//! A request lists origin and destination points, either as real node ids or
//! as positions on an original edge. Points are resolved against one
//! [`QueryGraphBuilder`], so origins and destinations that share an edge
//! position share a virtual node.

use std::time::Instant;

use sbi_common::{Error, PointSide, Result};
use serde::{Deserialize, Serialize};

use crate::config::MatrixConfig;
use crate::graph::{ChGraph, NodeId, QueryGraph, QueryGraphBuilder};
use crate::matrix::{DijkstraOneToMany, ManyToManySbi, MatrixCalculator, MatrixSnapResult, Snap};

/// Where a request point lies in the graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointLocation {
    Node(NodeId),
    Edge {
        base: NodeId,
        adj: NodeId,
        /// Position along `base -> adj`, in [0, 1]
        fraction: f64,
    },
}

/// Matrix columns to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutArray {
    Distances,
    Times,
}

/// Matrix calculator selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    ManyToManySbi,
    DijkstraOneToMany,
}

fn default_fail_fast() -> bool {
    true
}

fn default_out_arrays() -> Vec<OutArray> {
    vec![OutArray::Distances, OutArray::Times]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRequest {
    /// Shorthand for identical origins and destinations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_points: Vec<PointLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_points: Vec<PointLocation>,
    #[serde(default = "default_out_arrays")]
    pub out_arrays: Vec<OutArray>,
    /// Reject the request when any point cannot be resolved
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
    #[serde(default)]
    pub algorithm: Algorithm,
}

impl MatrixRequest {
    pub fn new(from_points: Vec<PointLocation>, to_points: Vec<PointLocation>) -> Self {
        Self {
            points: Vec::new(),
            from_points,
            to_points,
            out_arrays: default_out_arrays(),
            fail_fast: true,
            algorithm: Algorithm::default(),
        }
    }

    pub fn origins(&self) -> &[PointLocation] {
        if self.from_points.is_empty() {
            &self.points
        } else {
            &self.from_points
        }
    }

    pub fn destinations(&self) -> &[PointLocation] {
        if self.to_points.is_empty() {
            &self.points
        } else {
            &self.to_points
        }
    }
}

/// A request file holds a single request or a batch
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequestDocument {
    Batch(Vec<MatrixRequest>),
    Single(MatrixRequest),
}

impl RequestDocument {
    pub fn into_requests(self) -> Vec<MatrixRequest> {
        match self {
            RequestDocument::Batch(requests) => requests,
            RequestDocument::Single(request) => vec![request],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseInfo {
    /// Wall time in milliseconds
    pub took: u64,
    pub algorithm: &'static str,
    pub visited_nodes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixResponse {
    pub info: ResponseInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<Vec<Option<u64>>>>,
}

fn resolve(builder: &mut QueryGraphBuilder<'_>, point: &PointLocation) -> Result<Snap> {
    match *point {
        PointLocation::Node(node) => builder.snap_node(node),
        PointLocation::Edge {
            base,
            adj,
            fraction,
        } => builder.snap_edge(base, adj, fraction),
    }
}

fn resolve_all(
    builder: &mut QueryGraphBuilder<'_>,
    points: &[PointLocation],
    side: PointSide,
    fail_fast: bool,
) -> Result<MatrixSnapResult> {
    let mut lookups = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        match resolve(builder, point) {
            Ok(snap) => lookups.push(Some(snap)),
            Err(err) if fail_fast => {
                tracing::debug!(%side, index, error = %err, "point rejected");
                return Err(Error::PointNotFound { side, index });
            }
            Err(err) => {
                tracing::debug!(%side, index, error = %err, "point not found");
                lookups.push(None);
            }
        }
    }
    Ok(MatrixSnapResult::from_lookups(lookups))
}

pub fn create_calculator<'g>(
    algorithm: Algorithm,
    graph: &'g QueryGraph<'_>,
    config: &MatrixConfig,
) -> Box<dyn MatrixCalculator + 'g> {
    match algorithm {
        Algorithm::ManyToManySbi => Box::new(ManyToManySbi::new(graph, config)),
        Algorithm::DijkstraOneToMany => Box::new(DijkstraOneToMany::new(graph, config)),
    }
}

/// Resolve, compute and encode one request
pub fn solve(
    graph: &ChGraph,
    request: &MatrixRequest,
    config: &MatrixConfig,
) -> Result<MatrixResponse> {
    let start = Instant::now();

    let mut builder = QueryGraphBuilder::new(graph);
    let origins = resolve_all(
        &mut builder,
        request.origins(),
        PointSide::Origin,
        request.fail_fast,
    )?;
    let destinations = resolve_all(
        &mut builder,
        request.destinations(),
        PointSide::Destination,
        request.fail_fast,
    )?;
    let query_graph = builder.build();

    let mut calculator = create_calculator(request.algorithm, &query_graph, config);
    let matrix = calculator.calc_matrix(&origins, &destinations)?;
    let took = start.elapsed().as_millis() as u64;

    tracing::info!(
        origins = origins.size(),
        destinations = destinations.size(),
        algorithm = calculator.name(),
        visited = calculator.visited_nodes(),
        took_ms = took,
        "matrix computed"
    );
    tracing::debug!("{}", calculator.debug_string());

    let wants = |array: OutArray| request.out_arrays.contains(&array);
    Ok(MatrixResponse {
        info: ResponseInfo {
            took,
            algorithm: calculator.name(),
            visited_nodes: calculator.visited_nodes(),
        },
        distances: wants(OutArray::Distances).then(|| matrix.distance_rows(config.sentinel)),
        times: wants(OutArray::Times).then(|| matrix.time_rows(config.sentinel)),
    })
}
