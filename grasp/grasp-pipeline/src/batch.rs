//! Input batch produced by the upstream grasp sampler.

use std::path::{Path, PathBuf};

use grasp_types::{check_orthonormal, GraspCandidate, HandPose};
use mesh_io::load_ply;
use mesh_types::{Matrix3, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Directory next to the batch file holding the source hand meshes.
pub const HAND_MESH_DIR: &str = "test_meshes";

/// One generation batch: `K` candidate poses for a single object.
///
/// All arrays are indexed by candidate. `rotmat` rows are matrix rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationBatch {
    /// Object rotation per candidate.
    pub rotmat: Vec<[[f64; 3]; 3]>,
    /// Hand global orientation (axis-angle).
    pub global_orient: Vec<[f64; 3]>,
    /// Initial joint positions.
    pub joints: Vec<Vec<[f64; 3]>>,
    /// Articulation vectors.
    pub hand_pose: Vec<Vec<f64>>,
    /// Hand translations.
    pub transl: Vec<[f64; 3]>,
}

impl GenerationBatch {
    /// Load a batch file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rotmat.len()
    }

    /// Whether the batch has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rotmat.is_empty()
    }

    /// Check array lengths against each other and against the hand model.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidBatch`] describing the first mismatch.
    pub fn validate(&self, pose_dim: usize, joint_count: usize) -> PipelineResult<()> {
        let k = self.len();
        for (name, len) in [
            ("global_orient", self.global_orient.len()),
            ("joints", self.joints.len()),
            ("hand_pose", self.hand_pose.len()),
            ("transl", self.transl.len()),
        ] {
            if len != k {
                return Err(PipelineError::InvalidBatch(format!(
                    "{name} has {len} entries, rotmat has {k}"
                )));
            }
        }
        if let Some((i, pose)) = self.hand_pose.iter().enumerate().find(|(_, p)| p.len() != pose_dim) {
            return Err(PipelineError::InvalidBatch(format!(
                "hand_pose[{i}] has {} values, the hand model expects {pose_dim}",
                pose.len()
            )));
        }
        if let Some((i, joints)) = self.joints.iter().enumerate().find(|(_, j)| j.len() != joint_count) {
            return Err(PipelineError::InvalidBatch(format!(
                "joints[{i}] has {} joints, the hand model has {joint_count}",
                joints.len()
            )));
        }
        Ok(())
    }

    /// Rotation of candidate `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the matrix is not a
    /// rotation within `tolerance`.
    pub fn rotation(&self, index: usize, tolerance: f64) -> PipelineResult<Matrix3<f64>> {
        let rows = self.rotmat.get(index).ok_or_else(|| self.out_of_range(index))?;
        let rotation = Matrix3::from_fn(|r, c| rows[r][c]);
        check_orthonormal(&rotation, tolerance)?;
        Ok(rotation)
    }

    /// Assemble candidate `index` around its source hand vertices.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range index or an invalid rotation.
    pub fn candidate(
        &self,
        index: usize,
        source_vertices: &[Point3<f64>],
        tolerance: f64,
    ) -> PipelineResult<GraspCandidate> {
        let rotation = self.rotation(index, tolerance)?;
        let pose = HandPose::new(
            self.global_orient[index],
            self.hand_pose[index].clone(),
            self.transl[index],
        );
        let joints = self.joints[index].iter().copied().map(Point3::from).collect();
        Ok(GraspCandidate::new(index, rotation, pose, joints, source_vertices))
    }

    fn out_of_range(&self, index: usize) -> PipelineError {
        PipelineError::InvalidBatch(format!("candidate {index} outside 0..{}", self.len()))
    }
}

/// Path of the source hand mesh of candidate `index`.
///
/// ```
/// use std::path::Path;
/// use grasp_pipeline::hand_mesh_path;
///
/// assert_eq!(
///     hand_mesh_path(Path::new("/data/batch"), 42),
///     Path::new("/data/batch/test_meshes/000042_Hand.ply"),
/// );
/// ```
#[must_use]
pub fn hand_mesh_path(batch_dir: &Path, index: usize) -> PathBuf {
    batch_dir.join(HAND_MESH_DIR).join(format!("{index:06}_Hand.ply"))
}

/// Load the source hand vertices of candidate `index`.
///
/// # Errors
///
/// Returns [`PipelineError::MissingHandMesh`] when the file does not exist
/// and a mesh error when it cannot be parsed.
pub fn load_source_vertices(batch_dir: &Path, index: usize) -> PipelineResult<Vec<Point3<f64>>> {
    let path = hand_mesh_path(batch_dir, index);
    if !path.is_file() {
        return Err(PipelineError::MissingHandMesh(path));
    }
    Ok(load_ply(&path)?.vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn batch(k: usize) -> GenerationBatch {
        GenerationBatch {
            rotmat: vec![[[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]; k],
            global_orient: vec![[0.1, 0.2, 0.3]; k],
            joints: vec![vec![[0.0, 0.0, 0.1]; 2]; k],
            hand_pose: vec![vec![0.0; 4]; k],
            transl: vec![[0.0, 0.0, 0.2]; k],
        }
    }

    #[test]
    fn validates_lengths() {
        assert!(batch(3).validate(4, 2).is_ok());

        let mut short = batch(3);
        short.transl.pop();
        assert!(matches!(short.validate(4, 2), Err(PipelineError::InvalidBatch(_))));

        assert!(batch(3).validate(45, 2).unwrap_err().to_string().contains("expects 45"));
        assert!(batch(3).validate(4, 21).is_err());
    }

    #[test]
    fn rotmat_rows_are_matrix_rows() {
        let r = batch(1).rotation(0, 1e-4).unwrap();
        // 90 degrees about z: x goes to y.
        let v = r * Point3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(v, Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn rejects_non_rotations() {
        let mut b = batch(1);
        b.rotmat[0][0][0] = 2.0;
        assert!(matches!(b.rotation(0, 1e-4), Err(PipelineError::Types(_))));
        assert!(b.rotation(5, 1e-4).is_err());
    }

    #[test]
    fn candidate_rotates_source_and_zeroes_betas() {
        let c = batch(2)
            .candidate(1, &[Point3::new(1.0, 0.0, 0.0)], 1e-4)
            .unwrap();
        assert_eq!(c.index, 1);
        assert_eq!(c.pose.betas, vec![0.0; 10]);
        assert_relative_eq!(c.hand_vertices[0], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(c.joints.len(), 2);
    }

    #[test]
    fn missing_hand_mesh() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_source_vertices(dir.path(), 7),
            Err(PipelineError::MissingHandMesh(_))
        ));
    }

    #[test]
    fn parses_json() {
        let json = serde_json::to_string(&batch(2)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, json).unwrap();
        assert_eq!(GenerationBatch::load(&path).unwrap(), batch(2));
    }
}
