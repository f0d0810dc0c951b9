//! Midpoint subdivision.

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3};
use tracing::debug;

use crate::error::{SubdivideError, SubdivideResult};
use crate::params::{SubdivideParams, SubdivisionTarget};
use crate::result::SubdivisionResult;

/// Subdivide a mesh until the stop condition in `params` holds.
///
/// Each pass splits every triangle into four through its edge midpoints.
/// Midpoints are shared between neighbouring faces, so a closed mesh stays
/// closed and the geometry is unchanged.
///
/// # Errors
///
/// - [`SubdivideError::EmptyMesh`] / [`SubdivideError::NoFaces`] for empty input
/// - [`SubdivideError::InvalidIterations`] for `Passes(0)`
/// - [`SubdivideError::MeshTooLarge`] when a pass would exceed `max_faces`
/// - [`SubdivideError::PassLimit`] when `MinVertices` is not reached within
///   `max_passes`
///
/// # Examples
///
/// ```
/// use mesh_subdivide::{subdivide_mesh, SubdivideParams};
/// use mesh_types::unit_cube;
///
/// let result = subdivide_mesh(&unit_cube(), &SubdivideParams::until_vertex_count(100))?;
/// assert!(result.mesh.vertices.len() >= 100);
/// # Ok::<(), mesh_subdivide::SubdivideError>(())
/// ```
pub fn subdivide_mesh(
    mesh: &IndexedMesh,
    params: &SubdivideParams,
) -> SubdivideResult<SubdivisionResult> {
    if mesh.vertices.is_empty() {
        return Err(SubdivideError::EmptyMesh);
    }
    if mesh.faces.is_empty() {
        return Err(SubdivideError::NoFaces);
    }
    if params.target == SubdivisionTarget::Passes(0) {
        return Err(SubdivideError::InvalidIterations(0));
    }

    let mut current = mesh.clone();
    let mut passes = 0;
    loop {
        match params.target {
            SubdivisionTarget::Passes(n) if passes >= n => break,
            SubdivisionTarget::MinVertices(n) if current.vertices.len() >= n => break,
            SubdivisionTarget::MinVertices(target) if passes >= params.max_passes => {
                return Err(SubdivideError::PassLimit {
                    passes,
                    vertices: current.vertices.len(),
                    target,
                });
            }
            _ => {}
        }

        let projected = current.faces.len().saturating_mul(4);
        if projected > params.max_faces {
            return Err(SubdivideError::MeshTooLarge {
                current: current.faces.len(),
                projected,
                max: params.max_faces,
            });
        }

        current = subdivide_once(&current);
        passes += 1;
        debug!(
            pass = passes,
            faces = current.faces.len(),
            vertices = current.vertices.len(),
            "subdivision pass"
        );
    }

    Ok(SubdivisionResult {
        mesh: current,
        original_faces: mesh.faces.len(),
        original_vertices: mesh.vertices.len(),
        passes,
    })
}

/// One midpoint pass: every triangle becomes four.
#[must_use]
pub fn subdivide_once(mesh: &IndexedMesh) -> IndexedMesh {
    let mut splitter = EdgeSplitter {
        vertices: mesh.vertices.clone(),
        midpoints: HashMap::with_capacity(mesh.faces.len() * 3 / 2),
    };
    let mut faces = Vec::with_capacity(mesh.faces.len() * 4);

    for &[v0, v1, v2] in &mesh.faces {
        let m01 = splitter.midpoint(v0, v1);
        let m12 = splitter.midpoint(v1, v2);
        let m20 = splitter.midpoint(v2, v0);

        faces.push([v0, m01, m20]);
        faces.push([v1, m12, m01]);
        faces.push([v2, m20, m12]);
        faces.push([m01, m12, m20]);
    }

    IndexedMesh::from_parts(splitter.vertices, faces)
}

struct EdgeSplitter {
    vertices: Vec<Point3<f64>>,
    midpoints: HashMap<(u32, u32), u32>,
}

impl EdgeSplitter {
    fn midpoint(&mut self, a: u32, b: u32) -> u32 {
        let key = if a <= b { (a, b) } else { (b, a) };
        let vertices = &mut self.vertices;
        *self.midpoints.entry(key).or_insert_with(|| {
            let mid = midpoint_of(&vertices[a as usize], &vertices[b as usize]);
            let index = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
            vertices.push(mid);
            index
        })
    }
}

fn midpoint_of(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) * 0.5)
}
