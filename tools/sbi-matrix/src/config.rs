//! Matrix computation settings

use serde::{Deserialize, Serialize};

/// How cells without a path are written to JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SentinelEncoding {
    /// `null` for unreachable and unsnapped cells
    #[default]
    Null,
    /// The raw sentinel numbers (`f64::MAX`, `u64::MAX - 1`, `u64::MAX`)
    Literal,
}

/// Settings shared by every calculator of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Abort a computation after this many dequeued nodes
    #[serde(default)]
    pub max_visited_nodes: Option<usize>,
    #[serde(default)]
    pub sentinel: SentinelEncoding,
}

impl MatrixConfig {
    pub fn with_max_visited_nodes(mut self, limit: usize) -> Self {
        self.max_visited_nodes = Some(limit);
        self
    }

    pub fn with_sentinel(mut self, sentinel: SentinelEncoding) -> Self {
        self.sentinel = sentinel;
        self
    }
}
