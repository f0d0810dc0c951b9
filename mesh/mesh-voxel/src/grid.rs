//! Sparse voxel occupancy grid.

use hashbrown::HashSet;
use mesh_types::Point3;

use crate::coord::VoxelCoord;
use crate::error::{VoxelError, VoxelResult};

/// Set of occupied cells on a regular lattice anchored at the world origin.
///
/// Cell `c` spans `[c·pitch, (c+1)·pitch)` on each axis.
///
/// # Example
///
/// ```
/// use mesh_voxel::{VoxelCoord, VoxelGrid};
/// use mesh_types::Point3;
///
/// let mut grid = VoxelGrid::new(0.1).unwrap();
/// grid.insert_point(&Point3::new(0.15, 0.25, -0.05));
/// assert!(grid.contains(VoxelCoord::new(1, 2, -1)));
/// assert_eq!(grid.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    pitch: f64,
    inv_pitch: f64,
    occupied: HashSet<VoxelCoord>,
}

impl VoxelGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidPitch`] if `pitch` is not positive and finite.
    pub fn new(pitch: f64) -> VoxelResult<Self> {
        if !(pitch > 0.0 && pitch.is_finite()) {
            return Err(VoxelError::InvalidPitch(pitch));
        }
        Ok(Self {
            pitch,
            inv_pitch: 1.0 / pitch,
            occupied: HashSet::new(),
        })
    }

    /// Edge length of a cell.
    #[must_use]
    pub const fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Whether no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Cell containing a world point.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_grid(&self, point: &Point3<f64>) -> VoxelCoord {
        VoxelCoord::new(
            (point.x * self.inv_pitch).floor() as i32,
            (point.y * self.inv_pitch).floor() as i32,
            (point.z * self.inv_pitch).floor() as i32,
        )
    }

    /// World-space center of a cell.
    #[must_use]
    pub fn center(&self, coord: VoxelCoord) -> Point3<f64> {
        Point3::new(
            (f64::from(coord.x) + 0.5) * self.pitch,
            (f64::from(coord.y) + 0.5) * self.pitch,
            (f64::from(coord.z) + 0.5) * self.pitch,
        )
    }

    /// Marks a cell occupied. Returns `true` if it was newly inserted.
    pub fn insert(&mut self, coord: VoxelCoord) -> bool {
        self.occupied.insert(coord)
    }

    /// Marks the cell containing `point` occupied.
    pub fn insert_point(&mut self, point: &Point3<f64>) -> bool {
        let coord = self.world_to_grid(point);
        self.insert(coord)
    }

    /// Whether a cell is occupied.
    #[must_use]
    pub fn contains(&self, coord: VoxelCoord) -> bool {
        self.occupied.contains(&coord)
    }

    /// Occupied cells in ascending coordinate order.
    #[must_use]
    pub fn sorted_coords(&self) -> Vec<VoxelCoord> {
        let mut coords: Vec<_> = self.occupied.iter().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Centers of the occupied cells, in ascending coordinate order.
    #[must_use]
    pub fn centers(&self) -> Vec<Point3<f64>> {
        self.sorted_coords()
            .into_iter()
            .map(|c| self.center(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_bad_pitch() {
        assert!(matches!(VoxelGrid::new(0.0), Err(VoxelError::InvalidPitch(_))));
        assert!(VoxelGrid::new(-1.0).is_err());
        assert!(VoxelGrid::new(f64::NAN).is_err());
        assert!(VoxelGrid::new(f64::INFINITY).is_err());
    }

    #[test]
    fn floor_mapping_and_center() {
        let grid = VoxelGrid::new(0.01).unwrap();
        let coord = grid.world_to_grid(&Point3::new(-0.001, 0.019, 0.0));
        assert_eq!(coord, VoxelCoord::new(-1, 1, 0));

        let c = grid.center(coord);
        assert_relative_eq!(c.x, -0.005, epsilon = 1e-15);
        assert_relative_eq!(c.y, 0.015, epsilon = 1e-15);
        assert_relative_eq!(c.z, 0.005, epsilon = 1e-15);
    }

    #[test]
    fn centers_are_sorted_and_unique() {
        let mut grid = VoxelGrid::new(1.0).unwrap();
        assert!(grid.insert(VoxelCoord::new(2, 0, 0)));
        assert!(grid.insert(VoxelCoord::new(-1, 0, 0)));
        assert!(!grid.insert(VoxelCoord::new(2, 0, 0)));
        let centers = grid.centers();
        assert_eq!(centers.len(), 2);
        assert_relative_eq!(centers[0].x, -0.5);
        assert_relative_eq!(centers[1].x, 2.5);
    }
}
