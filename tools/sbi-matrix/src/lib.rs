//! sbi-matrix - many-to-many distance matrices on Contraction Hierarchies
//!
//! Computes origin x destination distance and time matrices with
//! Simultaneous Bucket Initialization: one shared backward sweep seeded from
//! every destination, then one shared forward sweep seeded from every origin,
//! both settling nodes in ascending hierarchy level.

pub mod batch;
pub mod config;
pub mod formats;
pub mod graph;
pub mod matrix;
pub mod request;

pub use config::{MatrixConfig, SentinelEncoding};
pub use graph::{ChGraph, ChGraphBuilder, QueryGraph, QueryGraphBuilder, RoutingChGraph};
pub use matrix::{DistanceMatrix, MatrixCalculator, MatrixCell, MatrixSnapResult, Snap};
pub use request::{MatrixRequest, MatrixResponse};
