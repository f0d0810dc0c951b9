//! Error types for SDF operations.

use thiserror::Error;

/// Result type for SDF operations.
pub type SdfResult<T> = Result<T, SdfError>;

/// Errors that can occur when building a distance field.
#[derive(Debug, Error)]
pub enum SdfError {
    /// Mesh is empty (no vertices or faces).
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidFaceIndex {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}
