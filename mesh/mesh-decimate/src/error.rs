//! Error types for mesh decimation operations.

use thiserror::Error;

/// Errors that can occur during decimation operations.
#[derive(Debug, Error)]
pub enum DecimateError {
    /// Mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// Invalid target ratio.
    #[error("invalid target ratio: {0} (must be between 0.0 and 1.0)")]
    InvalidRatio(f64),

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidFaceIndex {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices.
        vertex_count: usize,
    },
}

/// Result type for decimation operations.
pub type DecimateResult<T> = std::result::Result<T, DecimateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(DecimateError::EmptyMesh.to_string(), "mesh has no faces");
        assert!(DecimateError::InvalidRatio(1.5).to_string().contains("1.5"));
    }
}
