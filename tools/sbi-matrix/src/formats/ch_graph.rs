//! Leveled graph file
//!
//! ```json
//! {
//!   "levels": [0, 2, 1],
//!   "edges": [
//!     {"from": 0, "to": 1, "weight": 10.0, "time": 10000, "distance": 100.0, "reverse": true},
//!     {"from": 0, "to": 2, "weight": 14.0, "time": 14000, "distance": 140.0, "shortcut": true}
//!   ]
//! }
//! ```
//!
//! `reverse` adds the same edge in the opposite direction. Shortcuts are listed
//! once per direction; the loader files them under their lower endpoint.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::graph::{ChGraph, ChGraphBuilder, EdgeRecord, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed graph file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Graph(#[from] sbi_common::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    #[serde(default)]
    pub time: u64,
    pub distance: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shortcut: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reverse: bool,
}

impl From<EdgeRecord> for EdgeEntry {
    fn from(record: EdgeRecord) -> Self {
        Self {
            from: record.from,
            to: record.to,
            weight: record.weight,
            time: record.time,
            distance: record.distance,
            shortcut: record.shortcut,
            reverse: false,
        }
    }
}

/// Serialized form of a [`ChGraph`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub levels: Vec<u32>,
    pub edges: Vec<EdgeEntry>,
}

impl GraphDocument {
    pub fn from_graph(graph: &ChGraph) -> Self {
        Self {
            levels: graph.levels().to_vec(),
            edges: graph.edge_records().map(EdgeEntry::from).collect(),
        }
    }

    pub fn into_graph(self) -> Result<ChGraph> {
        let mut builder = ChGraphBuilder::new(self.levels);
        for entry in self.edges {
            let record = EdgeRecord {
                from: entry.from,
                to: entry.to,
                weight: entry.weight,
                time: entry.time,
                distance: entry.distance,
                shortcut: entry.shortcut,
            };
            builder.add_record(record)?;
            if entry.reverse {
                builder.add_record(EdgeRecord {
                    from: entry.to,
                    to: entry.from,
                    ..record
                })?;
            }
        }
        Ok(builder.build())
    }
}

pub struct ChGraphFile;

impl ChGraphFile {
    /// Write graph to JSON file
    pub fn write<P: AsRef<Path>>(path: P, graph: &ChGraph) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &GraphDocument::from_graph(graph))?;
        writer.flush()?;
        Ok(())
    }

    /// Read and validate graph from JSON file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ChGraph> {
        let file = File::open(path.as_ref())?;
        let document: GraphDocument = serde_json::from_reader(BufReader::new(file))?;
        let graph = document.into_graph()?;
        tracing::info!(
            path = %path.as_ref().display(),
            nodes = graph.n_nodes(),
            edges = graph.n_original_edges(),
            shortcuts = graph.n_shortcuts(),
            "graph loaded"
        );
        Ok(graph)
    }
}
