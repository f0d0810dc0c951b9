//! Persistence of accepted grasps and batch summaries.

use std::path::{Path, PathBuf};

use grasp_types::PersistedGrasp;
use mesh_io::save_ply;
use serde::Serialize;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Accepted index list file.
pub const VALID_FILE: &str = "valid.json";
/// Ordering file.
pub const ORDER_FILE: &str = "order.txt";

#[derive(Serialize)]
struct ValidList<'a> {
    all_valid: &'a [usize],
}

/// Writes run artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Create the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> PipelineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `{i:05}_Hand.ply`, `{i:05}_Object.ply` and `{i:05}_pose.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written.
    pub fn write_grasp(&self, grasp: &PersistedGrasp) -> PipelineResult<()> {
        let i = grasp.index;
        save_ply(&grasp.hand_mesh, self.dir.join(format!("{i:05}_Hand.ply")), true)?;
        save_ply(&grasp.object_mesh, self.dir.join(format!("{i:05}_Object.ply")), true)?;
        let pose_path = self.dir.join(format!("{i:05}_pose.json"));
        let json = serde_json::to_string_pretty(&grasp.pose)?;
        std::fs::write(&pose_path, json).map_err(|e| PipelineError::io(&pose_path, e))?;
        debug!(index = i, dir = %self.dir.display(), "wrote accepted grasp");
        Ok(())
    }

    /// Write `valid.json` and `order.txt`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub fn write_summary(&self, accepted: &[usize], order: &[usize]) -> PipelineResult<()> {
        let valid_path = self.dir.join(VALID_FILE);
        let json = serde_json::to_string(&ValidList { all_valid: accepted })?;
        std::fs::write(&valid_path, json).map_err(|e| PipelineError::io(&valid_path, e))?;

        let order_path = self.dir.join(ORDER_FILE);
        std::fs::write(&order_path, format_order(order)).map_err(|e| PipelineError::io(&order_path, e))?;
        Ok(())
    }
}

/// `[a b c]`, space separated.
#[must_use]
pub fn format_order(order: &[usize]) -> String {
    let joined = order.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    format!("[{joined}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use grasp_types::HandPose;
    use mesh_io::load_ply;
    use mesh_types::unit_cube;

    #[test]
    fn order_format() {
        assert_eq!(format_order(&[]), "[]");
        assert_eq!(format_order(&[7]), "[7]");
        assert_eq!(format_order(&[4, 0, 12]), "[4 0 12]");
    }

    #[test]
    fn writes_grasp_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::create(dir.path().join("out")).unwrap();
        let grasp = PersistedGrasp {
            index: 3,
            pose: HandPose::new([0.1, 0.0, 0.0], vec![0.5; 45], [0.0, 0.0, 0.3]),
            hand_mesh: unit_cube(),
            object_mesh: unit_cube(),
        };
        writer.write_grasp(&grasp).unwrap();

        let hand = load_ply(writer.dir().join("00003_Hand.ply")).unwrap();
        assert_eq!(hand.faces.len(), 12);
        assert!(writer.dir().join("00003_Object.ply").is_file());

        let pose: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(writer.dir().join("00003_pose.json")).unwrap()).unwrap();
        assert_eq!(pose["hand_pose"].as_array().unwrap().len(), 45);
        assert_eq!(pose["betas"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn writes_summary_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::create(dir.path()).unwrap();
        writer.write_summary(&[2, 5], &[5, 0, 2]).unwrap();

        let valid = std::fs::read_to_string(dir.path().join(VALID_FILE)).unwrap();
        assert_eq!(valid, r#"{"all_valid":[2,5]}"#);
        let order = std::fs::read_to_string(dir.path().join(ORDER_FILE)).unwrap();
        assert_eq!(order, "[5 0 2]");
    }
}
