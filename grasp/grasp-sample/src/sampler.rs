//! Per-candidate rotation and surface sampling.

use grasp_types::{check_orthonormal, ObjectSample};
use mesh_types::{IndexedMesh, Matrix3, MeshTopology, Point3, Vector3};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::asset::{check_mesh, ObjectAsset};
use crate::error::{SampleError, SampleResult};
use crate::params::SampleParams;

/// Rotate the prepared object and draw the surface sample for one candidate.
///
/// The RNG is reseeded from `params.seed` on every call, so two candidates
/// with the same rotation get identical samples.
///
/// # Errors
///
/// Returns [`SampleError::Rotation`] when `rotation` is not orthonormal
/// within `params.rotation_tolerance`, plus the errors of [`sample_surface`].
///
/// # Example
///
/// ```
/// use grasp_sample::{sample_object, ObjectAsset, SampleParams};
/// use mesh_types::{axis_aligned_box, Matrix3, Point3};
///
/// let params = SampleParams::default().with_sample_count(200).with_asset_scale(1.0);
/// let cube = axis_aligned_box(Point3::new(0.0, 0.0, 0.0), Point3::new(0.04, 0.02, 0.02));
/// let asset = ObjectAsset::prepare(cube, None, &params).unwrap();
///
/// let sample = sample_object(&asset, &Matrix3::identity(), &params).unwrap();
/// assert_eq!(sample.points.len(), 200);
/// ```
pub fn sample_object(
    asset: &ObjectAsset,
    rotation: &Matrix3<f64>,
    params: &SampleParams,
) -> SampleResult<ObjectSample> {
    check_orthonormal(rotation, params.rotation_tolerance)?;

    let mut mesh = asset.mesh().clone();
    mesh.rotate(rotation);
    let (points, normals) = sample_surface(&mesh, params.sample_count, params.seed)?;
    debug!(
        samples = points.len(),
        vertices = mesh.vertices.len(),
        "sampled object surface"
    );

    Ok(ObjectSample {
        mesh,
        rotation: *rotation,
        points,
        normals,
        scale: asset.scale(),
    })
}

/// Draw `count` area-weighted uniform surface samples with their face normals.
///
/// Faces are chosen with probability proportional to area, then a point is
/// drawn uniformly inside the face.
///
/// # Errors
///
/// Returns [`SampleError::ZeroSamples`], [`SampleError::EmptyMesh`],
/// [`SampleError::InvalidIndices`] or [`SampleError::ZeroArea`].
pub fn sample_surface(
    mesh: &IndexedMesh,
    count: usize,
    seed: u64,
) -> SampleResult<(Vec<Point3<f64>>, Vec<Vector3<f64>>)> {
    if count == 0 {
        return Err(SampleError::ZeroSamples);
    }
    check_mesh(mesh, "object")?;

    let faces = WeightedIndex::new(mesh.face_areas()).map_err(|_| SampleError::ZeroArea)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);

    for _ in 0..count {
        let face = faces.sample(&mut rng);
        let Some(tri) = mesh.triangle(face) else {
            return Err(SampleError::InvalidIndices("object"));
        };
        let (mut u, mut v) = (rng.r#gen::<f64>(), rng.r#gen::<f64>());
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        points.push(tri.point_at(u, v));
        // Zero-area faces have zero weight and are never drawn.
        normals.push(tri.normal().unwrap_or_else(Vector3::z));
    }
    Ok((points, normals))
}
