//! Error types for voxel operations.

use thiserror::Error;

/// Errors that can occur during voxel operations.
#[derive(Debug, Error)]
pub enum VoxelError {
    /// The voxel pitch must be positive and finite.
    #[error("voxel pitch must be positive, got {0}")]
    InvalidPitch(f64),

    /// The mesh has no faces to voxelize.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references a vertex that does not exist.
    #[error("face {face} references missing vertex {index}")]
    InvalidFaceIndex {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: u32,
    },
}

/// Result type for voxel operations.
pub type VoxelResult<T> = std::result::Result<T, VoxelError>;
