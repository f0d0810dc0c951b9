//! Error types for object sampling.

use grasp_types::GraspTypesError;
use mesh_io::IoError;
use mesh_subdivide::SubdivideError;
use thiserror::Error;

/// Errors that can occur while preparing or sampling an object.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The object or handle mesh could not be read.
    #[error("failed to load object asset: {0}")]
    Io(#[from] IoError),

    /// Densification failed, typically because the pass bound was reached.
    #[error("failed to densify object mesh: {0}")]
    Subdivide(#[from] SubdivideError),

    /// The rotation was rejected.
    #[error(transparent)]
    Rotation(#[from] GraspTypesError),

    /// The mesh has no vertices or no faces.
    #[error("{0} mesh is empty")]
    EmptyMesh(&'static str),

    /// A face references a vertex that does not exist.
    #[error("{0} mesh has out-of-range face indices")]
    InvalidIndices(&'static str),

    /// Every face is degenerate.
    #[error("object mesh has zero surface area")]
    ZeroArea,

    /// A sample count of zero was requested.
    #[error("sample count must be positive")]
    ZeroSamples,

    /// Parameters failed validation.
    #[error("invalid sampler parameters: {0}")]
    InvalidParams(String),
}

/// Result type for sampling operations.
pub type SampleResult<T> = std::result::Result<T, SampleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(SampleError::EmptyMesh("handle").to_string(), "handle mesh is empty");
        let err = SampleError::from(SubdivideError::NoFaces);
        assert!(err.to_string().starts_with("failed to densify"));
    }
}
