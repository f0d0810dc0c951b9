//! Hand pose parameters and grasp candidates.

use mesh_types::{Matrix3, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{GraspTypesError, GraspTypesResult};

/// Length of the shape vector. Shape is always the canonical zero vector.
pub const BETAS_DIM: usize = 10;

/// Default tolerance for [`check_orthonormal`].
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-4;

/// Hand pose dictionary, as persisted for accepted grasps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    /// Shape parameters (zeros).
    pub betas: Vec<f64>,
    /// Global orientation, axis-angle.
    pub global_orient: [f64; 3],
    /// Articulation vector.
    pub hand_pose: Vec<f64>,
    /// Translation.
    pub transl: [f64; 3],
}

impl HandPose {
    /// Pose with zero shape.
    #[must_use]
    pub fn new(global_orient: [f64; 3], hand_pose: Vec<f64>, transl: [f64; 3]) -> Self {
        Self {
            betas: vec![0.0; BETAS_DIM],
            global_orient,
            hand_pose,
            transl,
        }
    }

    /// Same pose with a different articulation vector.
    #[must_use]
    pub fn with_hand_pose(&self, hand_pose: Vec<f64>) -> Self {
        Self {
            hand_pose,
            ..self.clone()
        }
    }
}

/// Fail unless `RᵀR` is the identity within `tolerance` and `det R > 0`.
///
/// # Errors
///
/// Returns [`GraspTypesError::NotOrthonormal`] otherwise.
pub fn check_orthonormal(rotation: &Matrix3<f64>, tolerance: f64) -> GraspTypesResult<()> {
    let deviation = (rotation.transpose() * rotation - Matrix3::identity()).amax();
    if deviation > tolerance || !deviation.is_finite() || rotation.determinant() <= 0.0 {
        return Err(GraspTypesError::NotOrthonormal {
            deviation,
            tolerance,
        });
    }
    Ok(())
}

/// One candidate grasp from the generation batch.
///
/// The hand vertices are the upstream source mesh rotated into the object
/// sample frame; joints are taken as given.
#[derive(Debug, Clone)]
pub struct GraspCandidate {
    /// Index within the batch.
    pub index: usize,
    /// Object rotation for this candidate.
    pub rotation: Matrix3<f64>,
    /// Initial pose.
    pub pose: HandPose,
    /// Initial joint positions.
    pub joints: Vec<Point3<f64>>,
    /// Initial hand vertices, rotated by `rotation`.
    pub hand_vertices: Vec<Point3<f64>>,
}

impl GraspCandidate {
    /// Build a candidate, rotating the source hand vertices (`v ← R v`).
    #[must_use]
    pub fn new(
        index: usize,
        rotation: Matrix3<f64>,
        pose: HandPose,
        joints: Vec<Point3<f64>>,
        source_vertices: &[Point3<f64>],
    ) -> Self {
        let hand_vertices = source_vertices.iter().map(|v| rotation * v).collect();
        Self {
            index,
            rotation,
            pose,
            joints,
            hand_vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    #[test]
    fn new_pose_has_zero_betas() {
        let pose = HandPose::new([0.1, 0.2, 0.3], vec![0.0; 45], [0.0, 0.0, 0.5]);
        assert_eq!(pose.betas, vec![0.0; 10]);
        let moved = pose.with_hand_pose(vec![1.0; 45]);
        assert_eq!(moved.global_orient, pose.global_orient);
        assert_eq!(moved.hand_pose[0], 1.0);
    }

    #[test]
    fn pose_json_keys() {
        let pose = HandPose::new([0.0; 3], vec![0.5; 2], [1.0, 2.0, 3.0]);
        let json = serde_json::to_value(&pose).unwrap();
        for key in ["betas", "global_orient", "hand_pose", "transl"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn orthonormal_check() {
        let r = *Rotation3::from_euler_angles(0.3, -1.2, 2.0).matrix();
        assert!(check_orthonormal(&r, ORTHONORMAL_TOLERANCE).is_ok());
        assert!(check_orthonormal(&(r * 1.01), ORTHONORMAL_TOLERANCE).is_err());

        let mut reflection = Matrix3::identity();
        reflection[(2, 2)] = -1.0;
        assert!(check_orthonormal(&reflection, ORTHONORMAL_TOLERANCE).is_err());
    }

    #[test]
    fn candidate_rotates_source_vertices() {
        let r = *Rotation3::from_axis_angle(&nalgebra::Vector3::z_axis(), std::f64::consts::FRAC_PI_2)
            .matrix();
        let candidate = GraspCandidate::new(
            7,
            r,
            HandPose::new([0.0; 3], vec![], [0.0; 3]),
            vec![Point3::new(1.0, 0.0, 0.0)],
            &[Point3::new(1.0, 0.0, 0.0)],
        );
        let v = candidate.hand_vertices[0];
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
        assert_eq!(candidate.joints[0], Point3::new(1.0, 0.0, 0.0));
    }
}
