//! Pose-linear blend hand model.

use std::path::Path;

use grasp_types::HandPose;
use mesh_types::{Point3, Vector3};
use nalgebra::{DMatrix, DVector, Rotation3};
use serde::{Deserialize, Serialize};

use crate::error::{RefineError, RefineResult};
use crate::hand::{HandModel, HandOutput};

/// A hand whose rest shape deforms linearly in the articulation vector:
///
/// ```text
/// v = R(global_orient) · (T + B θ) + transl
/// ```
///
/// Joints follow the same rule with their own template and basis. The
/// vector-Jacobian product is exact: `∂L/∂θ = Bᵀ Rᵀ g`.
///
/// # Example
///
/// ```
/// use grasp_refine::{HandModel, LinearHandModel};
/// use grasp_types::HandPose;
/// use mesh_types::{Point3, Vector3};
///
/// // One vertex sliding along x, one joint sliding along y.
/// let model = LinearHandModel::new(
///     vec![Point3::origin()],
///     vec![Point3::origin()],
///     vec![vec![Vector3::x()]],
///     vec![vec![Vector3::y()]],
///     Vec::new(),
/// )
/// .unwrap();
///
/// let pose = HandPose::new([0.0; 3], vec![2.0], [0.0, 0.0, 1.0]);
/// let out = model.forward(&pose).unwrap();
/// assert_eq!(out.vertices[0], Point3::new(2.0, 0.0, 1.0));
/// assert_eq!(out.joints[0], Point3::new(0.0, 2.0, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct LinearHandModel {
    template_vertices: Vec<Point3<f64>>,
    template_joints: Vec<Point3<f64>>,
    /// `3V × P`, row `3i + k` is coordinate `k` of vertex `i`.
    vertex_basis: DMatrix<f64>,
    /// `3J × P`.
    joint_basis: DMatrix<f64>,
    faces: Vec<[u32; 3]>,
}

/// On-disk layout. Bases are indexed `[pose component][vertex]`.
#[derive(Debug, Serialize, Deserialize)]
struct LinearHandFile {
    template_vertices: Vec<[f64; 3]>,
    template_joints: Vec<[f64; 3]>,
    vertex_basis: Vec<Vec<[f64; 3]>>,
    joint_basis: Vec<Vec<[f64; 3]>>,
    faces: Vec<[u32; 3]>,
}

impl LinearHandModel {
    /// Build a model from templates and per-component displacement fields.
    ///
    /// `vertex_basis[k][i]` is the displacement of vertex `i` per unit of
    /// pose component `k`; `joint_basis` likewise for joints.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidModel`] if the bases disagree in
    /// dimension with the templates or with each other, or if a face
    /// references a missing vertex.
    pub fn new(
        template_vertices: Vec<Point3<f64>>,
        template_joints: Vec<Point3<f64>>,
        vertex_basis: Vec<Vec<Vector3<f64>>>,
        joint_basis: Vec<Vec<Vector3<f64>>>,
        faces: Vec<[u32; 3]>,
    ) -> RefineResult<Self> {
        if vertex_basis.len() != joint_basis.len() {
            return Err(RefineError::InvalidModel(format!(
                "vertex basis has {} components, joint basis has {}",
                vertex_basis.len(),
                joint_basis.len()
            )));
        }
        let vertex_basis = stack_basis(&vertex_basis, template_vertices.len(), "vertex")?;
        let joint_basis = stack_basis(&joint_basis, template_joints.len(), "joint")?;

        let vertex_count = template_vertices.len();
        if let Some((f, face)) = faces
            .iter()
            .enumerate()
            .find(|(_, face)| face.iter().any(|&i| i as usize >= vertex_count))
        {
            return Err(RefineError::InvalidModel(format!(
                "face {f} {face:?} references a vertex outside 0..{vertex_count}"
            )));
        }

        Ok(Self {
            template_vertices,
            template_joints,
            vertex_basis,
            joint_basis,
            faces,
        })
    }

    /// Parse a model from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for malformed input, or
    /// [`RefineError::InvalidModel`] for inconsistent dimensions.
    pub fn from_json_str(json: &str) -> RefineResult<Self> {
        let file: LinearHandFile = serde_json::from_str(json)?;
        Self::new(
            file.template_vertices.into_iter().map(Point3::from).collect(),
            file.template_joints.into_iter().map(Point3::from).collect(),
            to_vectors(file.vertex_basis),
            to_vectors(file.joint_basis),
            file.faces,
        )
    }

    /// Load a model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> RefineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write the model as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> RefineResult<()> {
        let file = LinearHandFile {
            template_vertices: self.template_vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
            template_joints: self.template_joints.iter().map(|p| [p.x, p.y, p.z]).collect(),
            vertex_basis: unstack_basis(&self.vertex_basis),
            joint_basis: unstack_basis(&self.joint_basis),
            faces: self.faces.clone(),
        };
        std::fs::write(path, serde_json::to_string(&file)?)?;
        Ok(())
    }

    fn check_pose(&self, pose: &HandPose) -> RefineResult<()> {
        if pose.hand_pose.len() == self.pose_dim() {
            Ok(())
        } else {
            Err(RefineError::DimensionMismatch {
                what: "hand_pose",
                expected: self.pose_dim(),
                got: pose.hand_pose.len(),
            })
        }
    }
}

impl HandModel for LinearHandModel {
    fn vertex_count(&self) -> usize {
        self.template_vertices.len()
    }

    fn joint_count(&self) -> usize {
        self.template_joints.len()
    }

    fn pose_dim(&self) -> usize {
        self.vertex_basis.ncols()
    }

    fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    fn forward(&self, pose: &HandPose) -> RefineResult<HandOutput> {
        self.check_pose(pose)?;
        let theta = DVector::from_column_slice(&pose.hand_pose);
        let rotation = Rotation3::new(Vector3::from(pose.global_orient));
        let transl = Vector3::from(pose.transl);

        let place = |template: &[Point3<f64>], offsets: DVector<f64>| -> Vec<Point3<f64>> {
            template
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let local = t + Vector3::new(offsets[3 * i], offsets[3 * i + 1], offsets[3 * i + 2]);
                    rotation * local + transl
                })
                .collect()
        };

        Ok(HandOutput {
            vertices: place(&self.template_vertices, &self.vertex_basis * &theta),
            joints: place(&self.template_joints, &self.joint_basis * &theta),
        })
    }

    fn pose_gradient(
        &self,
        pose: &HandPose,
        d_vertices: &[Vector3<f64>],
        d_joints: &[Vector3<f64>],
    ) -> RefineResult<Vec<f64>> {
        self.check_pose(pose)?;
        if d_vertices.len() != self.vertex_count() {
            return Err(RefineError::DimensionMismatch {
                what: "vertex gradient",
                expected: self.vertex_count(),
                got: d_vertices.len(),
            });
        }
        if d_joints.len() != self.joint_count() {
            return Err(RefineError::DimensionMismatch {
                what: "joint gradient",
                expected: self.joint_count(),
                got: d_joints.len(),
            });
        }

        let inverse = Rotation3::new(Vector3::from(pose.global_orient)).inverse();
        let to_local = |grads: &[Vector3<f64>]| {
            DVector::from_iterator(
                grads.len() * 3,
                grads.iter().flat_map(|g| {
                    let l = inverse * g;
                    [l.x, l.y, l.z]
                }),
            )
        };

        let grad = self.vertex_basis.tr_mul(&to_local(d_vertices))
            + self.joint_basis.tr_mul(&to_local(d_joints));
        Ok(grad.iter().copied().collect())
    }
}

fn stack_basis(
    basis: &[Vec<Vector3<f64>>],
    count: usize,
    what: &str,
) -> RefineResult<DMatrix<f64>> {
    let mut matrix = DMatrix::zeros(count * 3, basis.len());
    for (k, component) in basis.iter().enumerate() {
        if component.len() != count {
            return Err(RefineError::InvalidModel(format!(
                "{what} basis component {k} has {} entries, template has {count}",
                component.len()
            )));
        }
        for (i, d) in component.iter().enumerate() {
            matrix[(3 * i, k)] = d.x;
            matrix[(3 * i + 1, k)] = d.y;
            matrix[(3 * i + 2, k)] = d.z;
        }
    }
    Ok(matrix)
}

fn unstack_basis(matrix: &DMatrix<f64>) -> Vec<Vec<[f64; 3]>> {
    (0..matrix.ncols())
        .map(|k| {
            (0..matrix.nrows() / 3)
                .map(|i| [matrix[(3 * i, k)], matrix[(3 * i + 1, k)], matrix[(3 * i + 2, k)]])
                .collect()
        })
        .collect()
}

fn to_vectors(basis: Vec<Vec<[f64; 3]>>) -> Vec<Vec<Vector3<f64>>> {
    basis
        .into_iter()
        .map(|c| c.into_iter().map(Vector3::from).collect())
        .collect()
}
