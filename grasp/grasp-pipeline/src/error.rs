//! Error types for the batch pipeline.

use std::path::PathBuf;

use grasp_refine::RefineError;
use grasp_sample::SampleError;
use grasp_types::GraspTypesError;
use grasp_validate::ValidateError;
use mesh_io::IoError;
use thiserror::Error;

/// Errors that can occur while running a batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input batch is inconsistent.
    #[error("invalid input batch: {0}")]
    InvalidBatch(String),

    /// A candidate's companion hand mesh is missing.
    #[error("missing hand mesh: {}", .0.display())]
    MissingHandMesh(PathBuf),

    /// Reading or writing a file failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Mesh loading or saving failed.
    #[error(transparent)]
    Mesh(#[from] IoError),

    /// A domain value was rejected.
    #[error(transparent)]
    Types(#[from] GraspTypesError),

    /// Object preparation or sampling failed.
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// Pose refinement failed.
    #[error(transparent)]
    Refine(#[from] RefineError),

    /// Geometric validation failed.
    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl PipelineError {
    /// Wrap an I/O error with the path it concerns.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_paths() {
        let err = PipelineError::MissingHandMesh(PathBuf::from("test_meshes/000003_Hand.ply"));
        assert_eq!(err.to_string(), "missing hand mesh: test_meshes/000003_Hand.ply");

        let err = PipelineError::io(
            "out/valid.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("out/valid.json"));
    }

    #[test]
    fn wraps_stage_errors() {
        let err: PipelineError = RefineError::EmptySample.into();
        assert_eq!(err.to_string(), "object sample is empty");
    }
}
