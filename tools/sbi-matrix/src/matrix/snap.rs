//! Resolved request points

use sbi_common::{Error, Result};

use crate::graph::NodeId;

/// Graph location a request point resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snap {
    /// Real node, or a virtual node when the point lies inside an edge
    pub closest_node: NodeId,
}

impl Snap {
    pub fn new(closest_node: NodeId) -> Self {
        Self { closest_node }
    }
}

/// Snaps of one side of a request, indexed by request position
///
/// Every position in `0..size` is either found (maps to a snap) or listed in
/// `points_not_found`, never both.
#[derive(Debug, Clone, Default)]
pub struct MatrixSnapResult {
    snaps: Vec<Snap>,
    slots: Vec<Option<usize>>,
    points_not_found: Vec<usize>,
}

impl MatrixSnapResult {
    /// Build from explicit `(request index, snap index)` pairs
    pub fn new(
        snaps: Vec<Snap>,
        snap_indexes: &[(usize, usize)],
        points_not_found: Vec<usize>,
    ) -> Result<Self> {
        let size = snap_indexes.len() + points_not_found.len();
        let mut slots = vec![None; size];
        let mut claimed = vec![false; size];

        for &(request_idx, snap_idx) in snap_indexes {
            if request_idx >= size || claimed[request_idx] {
                return Err(Error::InvalidSnapResult(format!(
                    "request index {request_idx} is out of range or listed twice"
                )));
            }
            if snap_idx >= snaps.len() {
                return Err(Error::InvalidSnapResult(format!(
                    "snap index {snap_idx} out of range ({} snaps)",
                    snaps.len()
                )));
            }
            claimed[request_idx] = true;
            slots[request_idx] = Some(snap_idx);
        }
        for &request_idx in &points_not_found {
            if request_idx >= size || claimed[request_idx] {
                return Err(Error::InvalidSnapResult(format!(
                    "not-found index {request_idx} is out of range or already resolved"
                )));
            }
            claimed[request_idx] = true;
        }

        let mut points_not_found = points_not_found;
        points_not_found.sort_unstable();
        Ok(Self {
            snaps,
            slots,
            points_not_found,
        })
    }

    /// One optional snap per request point, in request order
    pub fn from_lookups(lookups: impl IntoIterator<Item = Option<Snap>>) -> Self {
        let mut result = Self::default();
        for (idx, lookup) in lookups.into_iter().enumerate() {
            match lookup {
                Some(snap) => {
                    result.slots.push(Some(result.snaps.len()));
                    result.snaps.push(snap);
                }
                None => {
                    result.slots.push(None);
                    result.points_not_found.push(idx);
                }
            }
        }
        result
    }

    /// Total number of request points
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, idx: usize) -> Option<&Snap> {
        self.slots
            .get(idx)
            .copied()
            .flatten()
            .map(|snap_idx| &self.snaps[snap_idx])
    }

    pub fn is_found(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Some(_)))
    }

    pub fn points_not_found(&self) -> &[usize] {
        &self.points_not_found
    }

    pub fn snaps(&self) -> &[Snap] {
        &self.snaps
    }

    /// `(request index, snap)` for every resolved point, in request order
    pub fn found(&self) -> impl Iterator<Item = (usize, &Snap)> + '_ {
        (0..self.size()).filter_map(|idx| self.get(idx).map(|snap| (idx, snap)))
    }

    /// Reject snaps on nodes that a graph with `node_count` nodes lacks
    pub fn check_nodes(&self, node_count: usize) -> Result<()> {
        match self
            .snaps
            .iter()
            .find(|snap| snap.closest_node as usize >= node_count)
        {
            Some(snap) => Err(Error::NodeOutOfRange {
                node: snap.closest_node,
                node_count,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookups_partitions_indices() {
        let result =
            MatrixSnapResult::from_lookups([Some(Snap::new(4)), None, Some(Snap::new(7))]);
        assert_eq!(result.size(), 3);
        assert_eq!(result.points_not_found(), &[1]);
        assert!(result.is_found(0));
        assert!(!result.is_found(1));
        assert_eq!(result.get(2).unwrap().closest_node, 7);
        let found: Vec<_> = result.found().map(|(i, s)| (i, s.closest_node)).collect();
        assert_eq!(found, vec![(0, 4), (2, 7)]);
    }

    #[test]
    fn test_new_with_shared_snap() {
        let snaps = vec![Snap::new(1)];
        let result = MatrixSnapResult::new(snaps, &[(0, 0), (2, 0)], vec![1]).unwrap();
        assert_eq!(result.size(), 3);
        assert_eq!(result.get(2), result.get(0));
    }

    #[test]
    fn test_new_rejects_overlap_and_gaps() {
        let snaps = vec![Snap::new(1)];
        assert!(MatrixSnapResult::new(snaps.clone(), &[(0, 0)], vec![0]).is_err());
        assert!(MatrixSnapResult::new(snaps.clone(), &[(3, 0)], vec![]).is_err());
        assert!(MatrixSnapResult::new(snaps, &[(0, 5)], vec![]).is_err());
    }

    #[test]
    fn test_out_of_range_lookup() {
        let result = MatrixSnapResult::from_lookups([Some(Snap::new(0))]);
        assert!(result.get(5).is_none());
        assert!(!result.is_found(5));
    }

    #[test]
    fn test_check_nodes() {
        let result = MatrixSnapResult::from_lookups([Some(Snap::new(1)), None, Some(Snap::new(5))]);
        assert!(result.check_nodes(6).is_ok());
        assert!(matches!(
            result.check_nodes(5),
            Err(Error::NodeOutOfRange {
                node: 5,
                node_count: 5
            })
        ));
    }
}
