//! Validation outcomes and batch summaries.

use std::fmt;

use mesh_types::IndexedMesh;
use serde::{Deserialize, Serialize};

use crate::pose::HandPose;

/// Geometric and physical verdict for one refined grasp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityRecord {
    /// Fraction of hand voxels inside the object, in `[0, 1]`.
    pub penetration_volume: f64,
    /// Whether any hand vertex touches or enters the object.
    pub contact: bool,
    /// Number of hand vertices touching or inside the object.
    pub touching_vertices: usize,
    /// Simulated displacement in metres.
    pub displacement: f64,
    /// Whether `displacement` is the fallback value.
    pub displacement_fallback: bool,
    /// Final accept decision.
    pub accept: bool,
}

impl fmt::Display for ValidityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "penetration volume {:.5}, displacement {:.5}{}, contact {} ({} vertices), accept {}",
            self.penetration_volume,
            self.displacement,
            if self.displacement_fallback { " (fallback)" } else { "" },
            self.contact,
            self.touching_vertices,
            self.accept
        )
    }
}

/// An accepted grasp ready to be written out.
#[derive(Debug, Clone)]
pub struct PersistedGrasp {
    /// Candidate index.
    pub index: usize,
    /// Refined pose.
    pub pose: HandPose,
    /// Refined hand mesh.
    pub hand_mesh: IndexedMesh,
    /// Object mesh in the same frame.
    pub object_mesh: IndexedMesh,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Candidates attempted.
    pub processed: usize,
    /// Candidates accepted and written.
    pub accepted: usize,
    /// Candidates that ran to a decision and were rejected.
    pub rejected: usize,
    /// Candidates that errored.
    pub failed: usize,
    /// Indices of accepted candidates, in processing order.
    pub accepted_indices: Vec<usize>,
    /// Processed candidates ordered by the configured joint coordinate.
    pub order: Vec<usize>,
}

impl BatchReport {
    /// Acceptance rate over processed candidates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn acceptance_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.processed as f64
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} accepted, {} rejected, {} failed ({:.1}% accepted)",
            self.processed,
            self.accepted,
            self.rejected,
            self.failed,
            self.acceptance_rate() * 100.0
        )
    }
}
