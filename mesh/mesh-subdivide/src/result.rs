//! Result types for subdivision operations.

use mesh_types::IndexedMesh;

/// Result of mesh subdivision.
#[derive(Debug, Clone)]
pub struct SubdivisionResult {
    /// The subdivided mesh.
    pub mesh: IndexedMesh,

    /// Faces before subdivision.
    pub original_faces: usize,

    /// Vertices before subdivision.
    pub original_vertices: usize,

    /// Passes applied; zero when the input already met the target.
    pub passes: u32,
}

impl SubdivisionResult {
    /// Whether any pass ran.
    #[must_use]
    pub const fn was_subdivided(&self) -> bool {
        self.passes > 0
    }
}

impl std::fmt::Display for SubdivisionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "subdivided {} -> {} faces, {} -> {} vertices in {} passes",
            self.original_faces,
            self.mesh.faces.len(),
            self.original_vertices,
            self.mesh.vertices.len(),
            self.passes
        )
    }
}
