//! Result of a decimation run.

use mesh_types::IndexedMesh;

/// Decimated mesh plus collapse statistics.
#[derive(Debug, Clone)]
pub struct DecimationResult {
    /// The decimated mesh, compacted (no unreferenced vertices).
    pub mesh: IndexedMesh,

    /// Triangles in the input mesh.
    pub original_triangles: usize,

    /// Triangles in the output mesh.
    pub final_triangles: usize,

    /// Edge collapses applied.
    pub collapses_performed: usize,

    /// Collapses refused by the topology, flip or error checks.
    pub collapses_rejected: usize,
}

impl DecimationResult {
    /// Output triangles over input triangles.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_triangles == 0 {
            1.0
        } else {
            self.final_triangles as f64 / self.original_triangles as f64
        }
    }

    /// Whether any collapse happened.
    #[must_use]
    pub const fn was_decimated(&self) -> bool {
        self.collapses_performed > 0
    }
}

impl std::fmt::Display for DecimationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "decimated {} -> {} triangles (ratio {:.3}, {} collapses, {} rejected)",
            self.original_triangles,
            self.final_triangles,
            self.reduction_ratio(),
            self.collapses_performed,
            self.collapses_rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(final_triangles: usize, collapses: usize) -> DecimationResult {
        DecimationResult {
            mesh: IndexedMesh::new(),
            original_triangles: 1000,
            final_triangles,
            collapses_performed: collapses,
            collapses_rejected: 3,
        }
    }

    #[test]
    fn ratio_and_flag() {
        let halved = result(500, 250);
        assert!((halved.reduction_ratio() - 0.5).abs() < 1e-12);
        assert!(halved.was_decimated());
        assert!(!result(1000, 0).was_decimated());
    }

    #[test]
    fn display_mentions_counts() {
        let text = result(500, 250).to_string();
        assert!(text.contains("1000 -> 500"));
        assert!(text.contains("0.500"));
        assert!(text.contains("3 rejected"));
    }
}
