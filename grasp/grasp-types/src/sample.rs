//! Prepared object surface sample.

use mesh_types::{IndexedMesh, Matrix3, Point3, Vector3};

/// Constant fourth feature channel handed to contact predictors.
pub const FEATURE_CHANNEL: f64 = 0.2248;

/// Object mesh and surface sample in the candidate frame.
///
/// Points and normals are expressed in the centered, rotated object frame;
/// `points.len() == normals.len()` always.
#[derive(Debug, Clone)]
pub struct ObjectSample {
    /// Rescaled, centered, rotated and densified object mesh.
    pub mesh: IndexedMesh,
    /// Rotation applied to the object.
    pub rotation: Matrix3<f64>,
    /// Surface sample points.
    pub points: Vec<Point3<f64>>,
    /// Outward face normal at each sample.
    pub normals: Vec<Vector3<f64>>,
    /// Total factor applied to the raw asset coordinates.
    pub scale: f64,
}

impl ObjectSample {
    /// Number of sample points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the sample has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points as `(x, y, z, 0.2248)` feature rows.
    #[must_use]
    pub fn features(&self) -> Vec<[f64; 4]> {
        self.points
            .iter()
            .map(|p| [p.x, p.y, p.z, FEATURE_CHANNEL])
            .collect()
    }

    /// Largest distance from the origin to a mesh vertex.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.mesh.max_vertex_norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    #[test]
    fn features_append_constant_channel() {
        let sample = ObjectSample {
            mesh: unit_cube(),
            rotation: Matrix3::identity(),
            points: vec![Point3::new(0.1, 0.2, 0.3)],
            normals: vec![Vector3::z()],
            scale: 0.001,
        };
        assert_eq!(sample.features(), vec![[0.1, 0.2, 0.3, 0.2248]]);
        assert_eq!(sample.len(), 1);
        assert!((sample.bounding_radius() - 3.0_f64.sqrt()).abs() < 1e-12);
    }
}
