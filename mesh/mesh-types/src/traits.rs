//! Traits for mesh types.

use crate::{Aabb, Triangle};
use nalgebra::Point3;

/// Read-only access to mesh topology.
///
/// Algorithms that only walk vertices and triangles (distance queries,
/// voxelization, sampling) take `&impl MeshTopology` so they do not care
/// how the mesh is stored.
pub trait MeshTopology {
    /// Get the number of vertices.
    fn vertex_count(&self) -> usize;

    /// Get the number of faces (triangles).
    fn face_count(&self) -> usize;

    /// Check if the mesh is empty.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Get a vertex position by index.
    ///
    /// Returns `None` if the index is out of bounds.
    fn vertex(&self, index: usize) -> Option<&Point3<f64>>;

    /// Get a face by index as vertex indices.
    ///
    /// Returns `None` if the index is out of bounds.
    fn face(&self, index: usize) -> Option<[u32; 3]>;

    /// Get a triangle by face index with resolved vertex positions.
    ///
    /// Returns `None` if the face index or any of its vertex indices is
    /// out of bounds.
    fn triangle(&self, face_index: usize) -> Option<Triangle>;

    /// Iterate over all triangles with resolved vertex positions.
    ///
    /// Faces that reference missing vertices are skipped.
    fn triangles(&self) -> impl Iterator<Item = Triangle>;
}

/// Types that can compute a bounding box.
pub trait MeshBounds {
    /// Compute the axis-aligned bounding box.
    ///
    /// Returns an empty AABB if the mesh has no vertices.
    fn bounds(&self) -> Aabb;

    /// Compute the bounding box, returning `None` if empty.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }

    /// Get the center of the bounding box.
    fn center(&self) -> Point3<f64> {
        self.bounds().center()
    }
}
