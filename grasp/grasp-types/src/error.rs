//! Error types for the grasp data model.

use thiserror::Error;

/// Errors raised while building or checking grasp data.
#[derive(Debug, Error)]
pub enum GraspTypesError {
    /// A category name did not match any known category.
    #[error("unknown tool category '{0}' (expected one of: disk_placer, friem, ultrasound_probe, generic)")]
    UnknownCategory(String),

    /// A vector or list had the wrong length.
    #[error("{what}: expected {expected} entries, got {got}")]
    DimensionMismatch {
        /// What was being checked.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// A rotation matrix was not orthonormal within tolerance.
    #[error("rotation is not orthonormal (max |RᵀR - I| = {deviation:.3e}, tolerance {tolerance:.0e})")]
    NotOrthonormal {
        /// Largest absolute entry of `RᵀR - I`.
        deviation: f64,
        /// Allowed deviation.
        tolerance: f64,
    },
}

/// Result type for grasp data operations.
pub type GraspTypesResult<T> = std::result::Result<T, GraspTypesError>;
