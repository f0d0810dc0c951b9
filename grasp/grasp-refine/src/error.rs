//! Error types for pose refinement.

use thiserror::Error;

/// Errors that can occur during pose refinement.
#[derive(Debug, Error)]
pub enum RefineError {
    /// Input sizes do not match the hand model.
    #[error("{what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being checked.
        what: &'static str,
        /// Required size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// The loss or its gradient stopped being finite.
    #[error("non-finite {what} at iteration {iteration}")]
    NonFinite {
        /// `"loss"` or `"gradient"`.
        what: &'static str,
        /// Iteration at which it happened.
        iteration: usize,
    },

    /// The object sample has no points.
    #[error("object sample is empty")]
    EmptySample,

    /// Optimizer or evaluator parameters failed validation.
    #[error("invalid refinement parameters: {0}")]
    InvalidParams(String),

    /// A hand model file is inconsistent.
    #[error("invalid hand model: {0}")]
    InvalidModel(String),

    /// The contact predictor failed.
    #[error("contact predictor failed: {0}")]
    Predictor(String),

    /// Reading or writing a model file failed.
    #[error("hand model I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A model file is not valid JSON for the expected layout.
    #[error("hand model JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for refinement operations.
pub type RefineResult<T> = std::result::Result<T, RefineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = RefineError::NonFinite {
            what: "gradient",
            iteration: 12,
        };
        assert_eq!(err.to_string(), "non-finite gradient at iteration 12");

        let err = RefineError::DimensionMismatch {
            what: "hand_pose",
            expected: 45,
            got: 3,
        };
        assert!(err.to_string().contains("expected 45, got 3"));
    }
}
