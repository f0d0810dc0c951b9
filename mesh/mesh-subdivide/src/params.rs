//! Subdivision parameters.

/// When to stop subdividing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdivisionTarget {
    /// Apply exactly this many passes.
    Passes(u32),
    /// Apply passes while the vertex count is below this value.
    MinVertices(usize),
}

impl Default for SubdivisionTarget {
    fn default() -> Self {
        Self::Passes(1)
    }
}

/// Parameters for midpoint subdivision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdivideParams {
    /// Stop condition.
    pub target: SubdivisionTarget,

    /// Upper bound on passes for [`SubdivisionTarget::MinVertices`].
    pub max_passes: u32,

    /// Maximum faces allowed in the result.
    pub max_faces: usize,
}

impl Default for SubdivideParams {
    fn default() -> Self {
        Self {
            target: SubdivisionTarget::default(),
            max_passes: 8,
            max_faces: 10_000_000,
        }
    }
}

impl SubdivideParams {
    /// Exactly `iterations` passes.
    #[must_use]
    pub fn passes(iterations: u32) -> Self {
        Self {
            target: SubdivisionTarget::Passes(iterations),
            ..Self::default()
        }
    }

    /// Subdivide until at least `count` vertices exist.
    #[must_use]
    pub fn until_vertex_count(count: usize) -> Self {
        Self {
            target: SubdivisionTarget::MinVertices(count),
            ..Self::default()
        }
    }

    /// Set the pass bound for vertex-count targets.
    #[must_use]
    pub const fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set maximum faces allowed.
    #[must_use]
    pub const fn with_max_faces(mut self, max_faces: usize) -> Self {
        self.max_faces = max_faces;
        self
    }
}
