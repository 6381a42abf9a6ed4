//! Error types for the sbi-matrix toolkit
//!
//! Every failure inside a matrix computation is fatal for the whole request:
//! there is no partial result and no retry. Graph inconsistencies are caught
//! when the graph is built, never inside the propagation loops.

use std::fmt;

/// Which side of a matrix request a point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    Origin,
    Destination,
}

impl fmt::Display for PointSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointSide::Origin => write!(f, "origin"),
            PointSide::Destination => write!(f, "destination"),
        }
    }
}

/// Main error type for sbi-matrix operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A calculator instance was asked to compute a second matrix
    #[error("matrix calculator already used, create a new instance per call")]
    AlreadyRun,

    /// The configured cap on dequeued nodes was reached
    #[error("visited node limit of {limit} exceeded")]
    MaxVisitedNodesExceeded { limit: usize },

    /// Graph ingestion rejected an edge
    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge { from: u32, to: u32, reason: String },

    /// A node id does not exist in the graph
    #[error("node {node} out of range (graph has {node_count} nodes)")]
    NodeOutOfRange { node: u32, node_count: usize },

    /// The level table does not cover the node range
    #[error("level table has {levels} entries but the graph has {nodes} nodes")]
    LevelCountMismatch { levels: usize, nodes: usize },

    /// A point asked to snap onto an edge that is not in the graph
    #[error("no edge between {base} and {adj} to snap onto")]
    EdgeNotFound { base: u32, adj: u32 },

    /// Edge positions must be finite and within [0, 1]
    #[error("invalid edge fraction {0}, expected a value in [0, 1]")]
    InvalidFraction(f64),

    /// A snap result set whose indices are not partitioned into found / not found
    #[error("invalid snap result: {0}")]
    InvalidSnapResult(String),

    /// Fail-fast request with a point that could not be resolved
    #[error("{side} point {index} could not be resolved to a graph location")]
    PointNotFound { side: PointSide, index: usize },
}

/// Convenience result type for sbi-matrix operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::AlreadyRun.to_string(),
            "matrix calculator already used, create a new instance per call"
        );
        assert_eq!(
            Error::MaxVisitedNodesExceeded { limit: 10 }.to_string(),
            "visited node limit of 10 exceeded"
        );
        assert_eq!(
            Error::PointNotFound {
                side: PointSide::Destination,
                index: 3
            }
            .to_string(),
            "destination point 3 could not be resolved to a graph location"
        );
        assert_eq!(
            Error::InvalidEdge {
                from: 1,
                to: 2,
                reason: "weight is NaN".into()
            }
            .to_string(),
            "invalid edge 1 -> 2: weight is NaN"
        );
    }

    #[test]
    fn test_node_out_of_range_message() {
        assert_eq!(
            Error::NodeOutOfRange {
                node: 9,
                node_count: 4
            }
            .to_string(),
            "node 9 out of range (graph has 4 nodes)"
        );
    }

    #[test]
    fn test_errors_have_no_source() {
        use std::error::Error as _;

        assert!(Error::AlreadyRun.source().is_none());
        assert!(Error::InvalidFraction(1.5).source().is_none());
    }
}
