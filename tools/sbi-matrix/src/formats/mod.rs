//! On-disk formats
//!
//! - `ch_graph`: leveled graph with original edges and shortcuts (JSON)

pub mod ch_graph;

pub use ch_graph::{ChGraphFile, EdgeEntry, FormatError, GraphDocument};
