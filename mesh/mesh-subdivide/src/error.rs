//! Error types for mesh subdivision operations.

use thiserror::Error;

/// Errors that can occur during subdivision operations.
#[derive(Debug, Error)]
pub enum SubdivideError {
    /// Mesh has no vertices.
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// Mesh has no faces.
    #[error("mesh has no faces")]
    NoFaces,

    /// A fixed pass count of zero was requested.
    #[error("invalid iteration count: {0} (must be >= 1)")]
    InvalidIterations(u32),

    /// The next pass would exceed the face budget.
    #[error("subdivision would exceed maximum mesh size ({current} -> {projected} faces, max {max})")]
    MeshTooLarge {
        /// Current face count.
        current: usize,
        /// Face count after the next pass.
        projected: usize,
        /// Maximum allowed face count.
        max: usize,
    },

    /// The vertex target was not reached within the pass budget.
    #[error("{vertices} vertices after {passes} passes, needed {target}")]
    PassLimit {
        /// Passes performed.
        passes: u32,
        /// Vertex count reached.
        vertices: usize,
        /// Requested vertex count.
        target: usize,
    },
}

/// Result type for subdivision operations.
pub type SubdivideResult<T> = std::result::Result<T, SubdivideError>;
