//! Error types for grasp validation.

use mesh_decimate::DecimateError;
use mesh_sdf::SdfError;
use mesh_voxel::VoxelError;
use thiserror::Error;

/// Errors that can occur while validating a grasp.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The hand mesh has no faces.
    #[error("hand mesh is empty")]
    EmptyHandMesh,

    /// Voxelization of the hand produced no points.
    #[error("hand voxelization produced no points")]
    NoVoxelPoints,

    /// A batch size of zero was requested.
    #[error("{0} batch size must be positive")]
    ZeroBatchSize(&'static str),

    /// Validator parameters failed validation.
    #[error("invalid validation parameters: {0}")]
    InvalidParams(String),

    /// The object mesh could not be turned into a distance field.
    #[error("object field error: {0}")]
    Sdf(#[from] SdfError),

    /// Hand decimation failed.
    #[error("hand decimation failed: {0}")]
    Decimate(#[from] DecimateError),

    /// Hand voxelization failed.
    #[error("hand voxelization failed: {0}")]
    Voxel(#[from] VoxelError),
}

/// Result type for validation operations.
pub type ValidateResult<T> = std::result::Result<T, ValidateError>;

/// Failure reported by a [`Simulator`](crate::Simulator).
///
/// These never abort validation; the validator substitutes a fallback
/// displacement.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The simulator is not configured.
    #[error("simulator disabled")]
    Disabled,

    /// The simulator ran and reported a failure.
    #[error("simulation failed: {0}")]
    Failed(String),

    /// The simulator returned something that is not a finite number.
    #[error("simulator returned a non-finite displacement: {0}")]
    NonFinite(f64),

    /// Exchanging data with the simulator failed.
    #[error("simulator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            ValidateError::ZeroBatchSize("containment").to_string(),
            "containment batch size must be positive"
        );
        assert!(ValidateError::from(SdfError::EmptyMesh)
            .to_string()
            .starts_with("object field error"));
        assert_eq!(SimulationError::Disabled.to_string(), "simulator disabled");
    }
}
