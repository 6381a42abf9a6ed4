//! Many-to-many matrix calculators
//!
//! - `sbi`: Simultaneous Bucket Initialization on the hierarchy
//! - `dijkstra`: plain one-to-many Dijkstra per origin, used as a reference

pub mod bucket;
pub mod dijkstra;
pub mod distance_matrix;
pub mod pairing;
pub mod sbi;
pub mod snap;

pub use dijkstra::DijkstraOneToMany;
pub use distance_matrix::{
    DistanceMatrix, MatrixCell, DISTANCE_NO_PATH, DISTANCE_SNAP_ERROR, MAX_PATH_TIME,
    TIME_NO_PATH, TIME_SNAP_ERROR,
};
pub use sbi::{calc_matrix, ManyToManySbi};
pub use snap::{MatrixSnapResult, Snap};

use sbi_common::Result;

/// A one-shot matrix computation over a fixed graph
pub trait MatrixCalculator {
    /// Fill a matrix for the given snapped origins and destinations.
    ///
    /// An instance computes at most one matrix; a second call fails with
    /// `Error::AlreadyRun`.
    fn calc_matrix(
        &mut self,
        origins: &MatrixSnapResult,
        destinations: &MatrixSnapResult,
    ) -> Result<DistanceMatrix>;

    /// Nodes dequeued so far
    fn visited_nodes(&self) -> usize;

    fn name(&self) -> &'static str;

    /// Short human readable summary of the last computation
    fn debug_string(&self) -> String;
}
