//! Signed distance and containment queries against a closed mesh.

use mesh_types::{IndexedMesh, MeshTopology, Point3, Triangle, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::bvh::{Bvh, DEFAULT_MAX_LEAF_SIZE, DEFAULT_PARALLEL_THRESHOLD};
use crate::error::{SdfError, SdfResult};
use crate::query::{closest_point_on_triangle, ray_triangle_intersect, RayHit};

/// Relative tolerance for merging ray hits at the same parameter.
const HIT_MERGE_EPS: f64 = 1e-9;

/// Re-cast directions for axis rays that touch an edge or vertex.
///
/// No component is zero and no two are in a simple ratio, so these rays do
/// not line up with the edges of axis-aligned or octahedral meshes.
const SKEWED_DIRECTIONS: [[f64; 3]; 4] = [
    [0.871_236_4, 0.313_792_6, 0.377_051_9],
    [-0.297_305_1, 0.903_127_7, 0.309_840_2],
    [0.352_918_3, -0.268_437_5, 0.896_302_4],
    [-0.612_037_8, -0.541_093_2, -0.576_811_9],
];

/// Closest surface point for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Closest point on the surface.
    pub point: Point3<f64>,
    /// Face containing the closest point.
    pub face: u32,
    /// Euclidean distance from the query to `point`.
    pub distance: f64,
}

/// Distance and containment queries against a triangle mesh.
///
/// The mesh is stored with a BVH over its faces. All queries take `&self`,
/// so one field can be shared across rayon workers.
///
/// Containment casts rays along +X, +Y and +Z and takes the majority of the
/// three parity votes. A ray that touches an edge or vertex may pass through
/// the surface there or only graze it, so its vote is replaced by a re-cast
/// along a skewed direction that hits face interiors only.
///
/// # Example
///
/// ```
/// use mesh_sdf::SignedDistanceField;
/// use mesh_types::{axis_aligned_box, Point3};
///
/// let cube = axis_aligned_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
/// let sdf = SignedDistanceField::new(cube).unwrap();
///
/// assert!(sdf.contains(&Point3::new(0.1, 0.2, 0.3)));
/// assert!((sdf.distance(&Point3::new(0.0, 0.0, 0.5)) + 0.5).abs() < 1e-12);
/// assert!((sdf.distance(&Point3::new(3.0, 0.0, 0.0)) - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct SignedDistanceField {
    mesh: IndexedMesh,
    triangles: Vec<Triangle>,
    bvh: Bvh,
}

impl SignedDistanceField {
    /// Build the field for a mesh.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::EmptyMesh`] if the mesh has no faces and
    /// [`SdfError::InvalidFaceIndex`] if a face references a missing vertex.
    pub fn new(mesh: IndexedMesh) -> SdfResult<Self> {
        if mesh.is_empty() {
            return Err(SdfError::EmptyMesh);
        }

        let vertex_count = mesh.vertices.len();
        for (face, indices) in mesh.faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(SdfError::InvalidFaceIndex {
                    face,
                    index,
                    vertex_count,
                });
            }
        }

        let triangles: Vec<Triangle> = mesh.triangles().collect();
        let bvh = Bvh::build(&triangles, DEFAULT_MAX_LEAF_SIZE, DEFAULT_PARALLEL_THRESHOLD);
        debug!(
            faces = triangles.len(),
            depth = bvh.stats().max_depth,
            "built distance field"
        );

        Ok(Self {
            mesh,
            triangles,
            bvh,
        })
    }

    /// The mesh the field was built from.
    #[must_use]
    pub const fn mesh(&self) -> &IndexedMesh {
        &self.mesh
    }

    /// The acceleration structure over the mesh faces.
    #[must_use]
    pub const fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Exact closest point on the surface.
    #[must_use]
    pub fn closest_point(&self, point: &Point3<f64>) -> SurfaceHit {
        let nearest = self.bvh.nearest(point, |id| {
            (closest_point_on_triangle(*point, &self.triangles[id as usize]) - point).norm_squared()
        });
        // The field is never empty, so a nearest face always exists.
        let (face, dist_sq) = nearest.unwrap_or((0, f64::INFINITY));
        SurfaceHit {
            point: closest_point_on_triangle(*point, &self.triangles[face as usize]),
            face,
            distance: dist_sq.sqrt(),
        }
    }

    /// Distance to the nearest surface point.
    #[must_use]
    pub fn unsigned_distance(&self, point: &Point3<f64>) -> f64 {
        self.closest_point(point).distance
    }

    /// Inside/outside test by three-axis majority vote.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let mut candidates = Vec::new();
        let mut hits = Vec::new();
        let inside_votes = [Vector3::x(), Vector3::y(), Vector3::z()]
            .iter()
            .enumerate()
            .filter(|&(axis, dir)| self.parity_vote(point, dir, axis, &mut candidates, &mut hits))
            .count();
        inside_votes >= 2
    }

    /// Signed distance: negative inside, positive outside.
    #[must_use]
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        let d = self.unsigned_distance(point);
        if self.contains(point) { -d } else { d }
    }

    /// Containment for many points, evaluated in parallel.
    ///
    /// Output order matches input order.
    #[must_use]
    pub fn contains_points(&self, points: &[Point3<f64>]) -> Vec<bool> {
        points.par_iter().map(|p| self.contains(p)).collect()
    }

    /// Closest surface points for many queries, evaluated in parallel.
    ///
    /// Output order matches input order.
    #[must_use]
    pub fn closest_points(&self, points: &[Point3<f64>]) -> Vec<SurfaceHit> {
        points.par_iter().map(|p| self.closest_point(p)).collect()
    }

    /// Parity of the axis ray `dir`, re-cast along skewed directions when
    /// it touches an edge or vertex. Each axis starts at a different skewed
    /// direction so the three votes stay independent.
    fn parity_vote(
        &self,
        point: &Point3<f64>,
        dir: &Vector3<f64>,
        axis: usize,
        candidates: &mut Vec<u32>,
        hits: &mut Vec<RayHit>,
    ) -> bool {
        self.cast(point, dir, candidates, hits);
        if let Some(count) = clean_count(hits) {
            return count % 2 == 1;
        }
        let skewed = SKEWED_DIRECTIONS.iter().cycle().skip(axis).take(SKEWED_DIRECTIONS.len());
        for d in skewed {
            self.cast(point, &Vector3::from(*d), candidates, hits);
            if let Some(count) = clean_count(hits) {
                return count % 2 == 1;
            }
        }
        // Every direction touched the surface: the point sits on it or
        // within rounding of it. Merge coincident hits of the axis ray.
        self.cast(point, dir, candidates, hits);
        merged_count(hits) % 2 == 1
    }

    /// Collect every hit of the ray `point + t·dir`, `t > 0`, into `hits`.
    fn cast(
        &self,
        point: &Point3<f64>,
        dir: &Vector3<f64>,
        candidates: &mut Vec<u32>,
        hits: &mut Vec<RayHit>,
    ) {
        self.bvh.ray_candidates(point, dir, candidates);
        hits.clear();
        hits.extend(
            candidates
                .iter()
                .filter_map(|&id| ray_triangle_intersect(*point, *dir, &self.triangles[id as usize])),
        );
    }
}

/// Crossing count of one ray, or `None` if a hit lies on an edge or vertex.
fn clean_count(hits: &[RayHit]) -> Option<usize> {
    if hits.iter().any(|h| h.on_boundary) {
        None
    } else {
        Some(hits.len())
    }
}

/// Count hits with distinct ray parameters.
fn merged_count(hits: &mut [RayHit]) -> usize {
    hits.sort_unstable_by(|a, b| a.t.total_cmp(&b.t));
    let mut count = 0;
    let mut last = f64::NEG_INFINITY;
    for hit in hits.iter() {
        if hit.t - last > HIT_MERGE_EPS * hit.t.max(1.0) {
            count += 1;
        }
        last = hit.t;
    }
    count
}

/// Signed distance from a point to a mesh without keeping the field.
///
/// Builds a [`SignedDistanceField`] for a single query; prefer building the
/// field once when querying repeatedly.
///
/// # Errors
///
/// Same as [`SignedDistanceField::new`].
pub fn signed_distance(point: &Point3<f64>, mesh: &IndexedMesh) -> SdfResult<f64> {
    Ok(SignedDistanceField::new(mesh.clone())?.distance(point))
}
