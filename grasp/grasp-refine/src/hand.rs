//! Differentiable hand model interface.

use grasp_types::HandPose;
use mesh_types::{IndexedMesh, Point3, Vector3};

use crate::error::RefineResult;

/// Posed hand geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct HandOutput {
    /// Hand surface vertices.
    pub vertices: Vec<Point3<f64>>,
    /// Joint positions.
    pub joints: Vec<Point3<f64>>,
}

/// An articulated hand: pose in, vertices and joints out, with the
/// vector-Jacobian product needed for gradient descent on the articulation.
///
/// Implementations must be deterministic and thread-safe; the model is
/// shared read-only across candidates.
pub trait HandModel: Send + Sync {
    /// Number of surface vertices.
    fn vertex_count(&self) -> usize;

    /// Number of joints.
    fn joint_count(&self) -> usize;

    /// Length of the articulation vector.
    fn pose_dim(&self) -> usize;

    /// Surface triangles, indexing the vertices of [`HandOutput`].
    fn faces(&self) -> &[[u32; 3]];

    /// Evaluate the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the pose has the wrong dimension.
    fn forward(&self, pose: &HandPose) -> RefineResult<HandOutput>;

    /// `∂L/∂hand_pose` given `∂L/∂vertices` and `∂L/∂joints` at `pose`.
    ///
    /// # Errors
    ///
    /// Returns an error if any input has the wrong dimension.
    fn pose_gradient(
        &self,
        pose: &HandPose,
        d_vertices: &[Vector3<f64>],
        d_joints: &[Vector3<f64>],
    ) -> RefineResult<Vec<f64>>;

    /// Triangle mesh of a posed hand.
    fn mesh(&self, output: &HandOutput) -> IndexedMesh {
        IndexedMesh::from_parts(output.vertices.clone(), self.faces().to_vec())
    }
}
