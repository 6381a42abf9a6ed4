//! Dense origin x destination result matrix

use crate::config::SentinelEncoding;

/// Distance of a cell whose origin or destination could not be snapped
pub const DISTANCE_SNAP_ERROR: f64 = f64::MAX;
/// Time of a cell whose origin or destination could not be snapped
pub const TIME_SNAP_ERROR: u64 = u64::MAX;
/// Distance of a snapped pair without any connecting path
pub const DISTANCE_NO_PATH: f64 = f64::INFINITY;
/// Time of a snapped pair without any connecting path
pub const TIME_NO_PATH: u64 = u64::MAX - 1;
/// Largest time stored for a real path; saturated sums are capped here
pub const MAX_PATH_TIME: u64 = TIME_NO_PATH - 1;

/// Interpretation of one matrix cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixCell {
    Path { distance: f64, time: u64 },
    Unreachable,
    SnapError,
}

/// Row-major matrix of distances (meters) and times (milliseconds)
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n_origins: usize,
    n_destinations: usize,
    distances: Vec<f64>,
    times: Vec<u64>,
}

impl DistanceMatrix {
    /// Every cell starts as "no path"; rows of unsnapped origins and columns
    /// of unsnapped destinations are marked as snap errors.
    pub fn new(
        n_origins: usize,
        n_destinations: usize,
        origins_not_found: &[usize],
        destinations_not_found: &[usize],
    ) -> Self {
        let cells = n_origins * n_destinations;
        let mut matrix = Self {
            n_origins,
            n_destinations,
            distances: vec![DISTANCE_NO_PATH; cells],
            times: vec![TIME_NO_PATH; cells],
        };

        for &origin in origins_not_found.iter().filter(|&&o| o < n_origins) {
            for destination in 0..n_destinations {
                matrix.mark_snap_error(origin, destination);
            }
        }
        for &destination in destinations_not_found.iter().filter(|&&d| d < n_destinations) {
            for origin in 0..n_origins {
                matrix.mark_snap_error(origin, destination);
            }
        }
        matrix
    }

    fn mark_snap_error(&mut self, origin: usize, destination: usize) {
        let idx = origin * self.n_destinations + destination;
        self.distances[idx] = DISTANCE_SNAP_ERROR;
        self.times[idx] = TIME_SNAP_ERROR;
    }

    pub fn number_of_origins(&self) -> usize {
        self.n_origins
    }

    pub fn number_of_destinations(&self) -> usize {
        self.n_destinations
    }

    /// Store a found path; its time never collides with a sentinel
    #[inline]
    pub fn set_cell(&mut self, origin: usize, destination: usize, distance: f64, time: u64) {
        let idx = origin * self.n_destinations + destination;
        self.distances[idx] = distance;
        self.times[idx] = time.min(MAX_PATH_TIME);
    }

    pub fn distance(&self, origin: usize, destination: usize) -> f64 {
        self.distances[origin * self.n_destinations + destination]
    }

    pub fn time(&self, origin: usize, destination: usize) -> u64 {
        self.times[origin * self.n_destinations + destination]
    }

    pub fn cell(&self, origin: usize, destination: usize) -> MatrixCell {
        let distance = self.distance(origin, destination);
        let time = self.time(origin, destination);
        if time == TIME_SNAP_ERROR && distance == DISTANCE_SNAP_ERROR {
            MatrixCell::SnapError
        } else if time == TIME_NO_PATH && distance.is_infinite() {
            MatrixCell::Unreachable
        } else {
            MatrixCell::Path { distance, time }
        }
    }

    /// Distance rows for serialization; `None` becomes a JSON null
    ///
    /// JSON has no infinity, so the literal encoding writes `f64::MAX` for
    /// unreachable cells as well. Their times still tell them apart.
    pub fn distance_rows(&self, encoding: SentinelEncoding) -> Vec<Vec<Option<f64>>> {
        self.rows(|o, d| match (self.cell(o, d), encoding) {
            (MatrixCell::Path { distance, .. }, _) => Some(distance),
            (_, SentinelEncoding::Null) => None,
            (_, SentinelEncoding::Literal) => Some(f64::MAX),
        })
    }

    /// Time rows for serialization; `None` becomes a JSON null
    pub fn time_rows(&self, encoding: SentinelEncoding) -> Vec<Vec<Option<u64>>> {
        self.rows(|o, d| match (self.cell(o, d), encoding) {
            (MatrixCell::Path { time, .. }, _) => Some(time),
            (_, SentinelEncoding::Null) => None,
            (_, SentinelEncoding::Literal) => Some(self.time(o, d)),
        })
    }

    fn rows<T>(&self, value: impl Fn(usize, usize) -> T) -> Vec<Vec<T>> {
        (0..self.n_origins)
            .map(|o| (0..self.n_destinations).map(|d| value(o, d)).collect())
            .collect()
    }
}
