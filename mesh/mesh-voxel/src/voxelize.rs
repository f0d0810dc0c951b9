//! Surface voxelization.

use mesh_types::{IndexedMesh, Point3, Triangle};
use tracing::debug;

use crate::error::{VoxelError, VoxelResult};
use crate::grid::VoxelGrid;

/// Occupancy grid of the cells touched by a mesh surface.
///
/// Each triangle is split through its edge midpoints until every edge is
/// shorter than half the pitch; the cells holding the resulting vertices
/// and centroids are marked. Only the surface shell is marked, the interior
/// of a closed mesh stays empty.
///
/// # Errors
///
/// Returns [`VoxelError::InvalidPitch`] for a non-positive pitch,
/// [`VoxelError::EmptyMesh`] for a mesh without faces and
/// [`VoxelError::InvalidFaceIndex`] for dangling indices.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
/// use mesh_voxel::voxelize_surface;
///
/// let grid = voxelize_surface(&unit_cube(), 0.25).unwrap();
/// assert!(grid.len() >= 56);
/// assert!(!grid.contains(mesh_voxel::VoxelCoord::new(2, 2, 2)));
/// ```
pub fn voxelize_surface(mesh: &IndexedMesh, pitch: f64) -> VoxelResult<VoxelGrid> {
    let mut grid = VoxelGrid::new(pitch)?;
    if mesh.faces.is_empty() {
        return Err(VoxelError::EmptyMesh);
    }

    let max_edge = pitch * 0.5;
    let mut stack = Vec::new();
    for (face, indices) in mesh.faces.iter().enumerate() {
        let corners = indices.iter().map(|&i| {
            mesh.vertices
                .get(i as usize)
                .copied()
                .ok_or(VoxelError::InvalidFaceIndex { face, index: i })
        });
        let corners = corners.collect::<VoxelResult<Vec<_>>>()?;
        stack.push(Triangle::new(corners[0], corners[1], corners[2]));

        while let Some(tri) = stack.pop() {
            if tri.max_edge_length() < max_edge {
                for p in tri.vertices() {
                    grid.insert_point(&p);
                }
                grid.insert_point(&tri.centroid());
                continue;
            }
            let m01 = midpoint(&tri.v0, &tri.v1);
            let m12 = midpoint(&tri.v1, &tri.v2);
            let m20 = midpoint(&tri.v2, &tri.v0);
            stack.push(Triangle::new(tri.v0, m01, m20));
            stack.push(Triangle::new(m01, tri.v1, m12));
            stack.push(Triangle::new(m20, m12, tri.v2));
            stack.push(Triangle::new(m01, m12, m20));
        }
    }

    debug!(faces = mesh.faces.len(), pitch, voxels = grid.len(), "voxelized surface");
    Ok(grid)
}

fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::VoxelCoord;
    use mesh_types::{axis_aligned_box, unit_cube};

    #[test]
    fn cube_shell_has_no_core() {
        let grid = voxelize_surface(&unit_cube(), 0.25).unwrap();
        assert!(!grid.contains(VoxelCoord::new(1, 1, 1)));
        assert!(!grid.contains(VoxelCoord::new(2, 2, 2)));
        assert!(grid.contains(VoxelCoord::new(0, 0, 0)));
        assert!(grid.contains(VoxelCoord::new(0, 2, 1)));
    }

    #[test]
    fn every_center_is_near_the_surface() {
        let mesh = axis_aligned_box(Point3::new(-0.03, -0.02, -0.01), Point3::new(0.03, 0.02, 0.01));
        let pitch = 0.01;
        let grid = voxelize_surface(&mesh, pitch).unwrap();
        for c in grid.centers() {
            let dx = (c.x.abs() - 0.03).max(0.0);
            let dy = (c.y.abs() - 0.02).max(0.0);
            let dz = (c.z.abs() - 0.01).max(0.0);
            assert!(dx <= pitch && dy <= pitch && dz <= pitch, "{c:?} is off the surface");
        }
    }

    #[test]
    fn errors() {
        assert!(matches!(
            voxelize_surface(&IndexedMesh::new(), 0.01),
            Err(VoxelError::EmptyMesh)
        ));
        assert!(matches!(
            voxelize_surface(&unit_cube(), 0.0),
            Err(VoxelError::InvalidPitch(_))
        ));
        let mut broken = unit_cube();
        broken.faces.push([0, 1, 8]);
        assert!(matches!(
            voxelize_surface(&broken, 0.5),
            Err(VoxelError::InvalidFaceIndex { face: 12, index: 8 })
        ));
    }
}
