//! Simulator adapter around an external program.

use std::path::PathBuf;
use std::process::Command;

use grasp_validate::{SimulationError, Simulator};
use mesh_io::save_ply;
use mesh_types::IndexedMesh;
use tracing::debug;

/// Runs `program [args..] <hand.ply> <object.ply>` and reads the
/// displacement from the last non-empty line of its standard output.
///
/// Both meshes are written to a fresh temporary directory that is removed
/// when the call returns.
#[derive(Debug, Clone)]
pub struct CommandSimulator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSimulator {
    /// Create an adapter for `program` with leading `args`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Simulator for CommandSimulator {
    fn simulate(&self, hand: &IndexedMesh, object: &IndexedMesh) -> Result<f64, SimulationError> {
        let dir = tempfile::tempdir()?;
        let hand_path = dir.path().join("hand.ply");
        let object_path = dir.path().join("object.ply");
        save_ply(hand, &hand_path, true).map_err(|e| SimulationError::Failed(e.to_string()))?;
        save_ply(object, &object_path, true).map_err(|e| SimulationError::Failed(e.to_string()))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&hand_path)
            .arg(&object_path)
            .output()?;

        if !output.status.success() {
            return Err(SimulationError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .ok_or_else(|| SimulationError::Failed("simulator printed nothing".into()))?;
        let displacement: f64 = line
            .parse()
            .map_err(|_| SimulationError::Failed(format!("cannot parse displacement from {line:?}")))?;
        debug!(displacement, program = %self.program.display(), "simulation finished");
        Ok(displacement)
    }
}
