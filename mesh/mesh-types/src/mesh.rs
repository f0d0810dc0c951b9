//! Indexed triangle mesh.

use crate::{Aabb, MeshBounds, MeshTopology, Triangle};
use nalgebra::{Matrix3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// This is the mesh type shared by the whole workspace: hand meshes,
/// object assets and decimated collision proxies are all `IndexedMesh`.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Point3<f64>>` - Vertex positions
/// - `faces`: `Vec<[u32; 3]>` - Triangle faces as vertex indices
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside.
/// This means normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Point3, MeshTopology};
///
/// let mesh = IndexedMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertex positions and face indices.
    #[must_use]
    pub const fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Translate all vertices by an offset.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Scale all vertices uniformly about the origin.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.vertices {
            v.coords *= factor;
        }
    }

    /// Apply a linear map to every vertex (`v <- R v`).
    ///
    /// For a proper rotation the winding, and therefore the outward
    /// orientation, is preserved.
    pub fn rotate(&mut self, rotation: &Matrix3<f64>) {
        for v in &mut self.vertices {
            *v = Point3::from(rotation * v.coords);
        }
    }

    /// Largest distance from the origin to any vertex.
    ///
    /// Returns `0.0` for a mesh with no vertices.
    #[must_use]
    pub fn max_vertex_norm(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.coords.norm())
            .fold(0.0, f64::max)
    }

    /// Area of every face, in face order.
    ///
    /// Faces with out-of-range indices get area `0.0`.
    #[must_use]
    pub fn face_areas(&self) -> Vec<f64> {
        (0..self.faces.len())
            .map(|i| self.triangle(i).map_or(0.0, |t| t.area()))
            .collect()
    }

    /// Unit outward normal of a face, or `None` for degenerate faces.
    #[must_use]
    pub fn face_normal(&self, face_index: usize) -> Option<Vector3<f64>> {
        self.triangle(face_index).and_then(|t| t.normal())
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Positive when normals point outward. Only meaningful for closed
    /// meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let volume: f64 = self
            .triangles()
            .map(|t| t.v0.coords.dot(&t.v1.coords.cross(&t.v2.coords)))
            .sum();
        volume / 6.0
    }

    /// Absolute enclosed volume.
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }

    /// Check that every face references an existing vertex.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.vertices.len();
        self.faces
            .iter()
            .all(|f| f.iter().all(|&i| (i as usize) < n))
    }

    /// Append another mesh, offsetting its face indices.
    pub fn merge(&mut self, other: &Self) {
        #[allow(clippy::cast_possible_truncation)]
        // Mesh sizes stay far below u32::MAX
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|&[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    fn vertex(&self, index: usize) -> Option<&Point3<f64>> {
        self.vertices.get(index)
    }

    #[inline]
    fn face(&self, index: usize) -> Option<[u32; 3]> {
        self.faces.get(index).copied()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [a, b, c] = self.face(face_index)?;
        Some(Triangle::new(
            *self.vertices.get(a as usize)?,
            *self.vertices.get(b as usize)?,
            *self.vertices.get(c as usize)?,
        ))
    }

    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        (0..self.faces.len()).filter_map(|i| self.triangle(i))
    }
}

impl MeshBounds for IndexedMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}

/// Create a closed axis-aligned box mesh with outward CCW winding.
///
/// # Example
///
/// ```
/// use mesh_types::{axis_aligned_box, Point3};
///
/// let b = axis_aligned_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
/// assert!((b.signed_volume() - 8.0).abs() < 1e-10);
/// ```
#[must_use]
pub fn axis_aligned_box(min: Point3<f64>, max: Point3<f64>) -> IndexedMesh {
    let (a, b) = (min, max);
    let vertices = vec![
        Point3::new(a.x, a.y, a.z), // 0
        Point3::new(b.x, a.y, a.z), // 1
        Point3::new(b.x, b.y, a.z), // 2
        Point3::new(a.x, b.y, a.z), // 3
        Point3::new(a.x, a.y, b.z), // 4
        Point3::new(b.x, a.y, b.z), // 5
        Point3::new(b.x, b.y, b.z), // 6
        Point3::new(a.x, b.y, b.z), // 7
    ];
    let faces = vec![
        // -Z
        [0, 2, 1],
        [0, 3, 2],
        // +Z
        [4, 5, 6],
        [4, 6, 7],
        // -Y
        [0, 1, 5],
        [0, 5, 4],
        // +Y
        [3, 7, 6],
        [3, 6, 2],
        // -X
        [0, 4, 7],
        [0, 7, 3],
        // +X
        [1, 2, 6],
        [1, 6, 5],
    ];
    IndexedMesh::from_parts(vertices, faces)
}

/// Create the unit cube `[0, 1]^3`.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    axis_aligned_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}
