//! Parallel evaluation of independent requests
//!
//! Calculators are one-shot and never shared; every request gets its own
//! query graph and calculator, while the preprocessed graph is shared
//! read-only across the rayon pool.

use rayon::prelude::*;
use sbi_common::Result;

use crate::config::MatrixConfig;
use crate::graph::ChGraph;
use crate::request::{self, MatrixRequest, MatrixResponse};

/// Solve all requests in parallel, results in request order
pub fn solve_all(
    graph: &ChGraph,
    requests: &[MatrixRequest],
    config: &MatrixConfig,
) -> Vec<Result<MatrixResponse>> {
    tracing::debug!(requests = requests.len(), "solving batch");
    requests
        .par_iter()
        .map(|request| request::solve(graph, request, config))
        .collect()
}
