//! Object asset loading and one-time preparation.

use std::path::Path;

use mesh_io::load_mesh;
use mesh_subdivide::{subdivide_mesh, SubdivideParams};
use mesh_types::{Aabb, IndexedMesh, Vector3};
use tracing::{debug, info};

use crate::error::{SampleError, SampleResult};
use crate::params::SampleParams;

/// An object mesh scaled, centered and densified once per run.
///
/// Rotation and sampling happen per candidate in
/// [`sample_object`](crate::sample_object); midpoint subdivision commutes
/// with rotation, so densifying here gives the same mesh as densifying
/// after each rotation.
#[derive(Debug, Clone)]
pub struct ObjectAsset {
    mesh: IndexedMesh,
    scale: f64,
    offset: Vector3<f64>,
    subdivision_passes: u32,
}

impl ObjectAsset {
    /// Load the object (and optional handle) from PLY or STL files and prepare it.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Io`] for unreadable files, plus every error of
    /// [`ObjectAsset::prepare`].
    pub fn load(
        object: impl AsRef<Path>,
        handle: Option<&Path>,
        params: &SampleParams,
    ) -> SampleResult<Self> {
        let object = object.as_ref();
        let mesh = load_mesh(object)?;
        let handle = handle.map(load_mesh).transpose()?;
        info!(
            path = %object.display(),
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            handle = handle.is_some(),
            "loaded object asset"
        );
        Self::prepare(mesh, handle, params)
    }

    /// Prepare in-memory meshes.
    ///
    /// 1. multiply by `asset_scale`
    /// 2. if the max vertex norm exceeds `size_threshold`, shrink so it equals
    ///    `target_radius` (the handle gets the same factor)
    /// 3. subtract the bounding-box center of the handle, or of the object
    ///    when there is no handle
    /// 4. subdivide until the vertex count reaches `sample_count`
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::EmptyMesh`] or [`SampleError::InvalidIndices`]
    /// for unusable meshes, [`SampleError::Subdivide`] when densification
    /// hits its pass bound, and parameter validation errors.
    pub fn prepare(
        mut mesh: IndexedMesh,
        mut handle: Option<IndexedMesh>,
        params: &SampleParams,
    ) -> SampleResult<Self> {
        params.validate()?;
        check_mesh(&mesh, "object")?;
        if let Some(h) = &handle {
            if h.vertices.is_empty() {
                return Err(SampleError::EmptyMesh("handle"));
            }
        }

        let mut scale = params.asset_scale;
        mesh.scale(params.asset_scale);
        if let Some(h) = &mut handle {
            h.scale(params.asset_scale);
        }

        let max_norm = mesh.max_vertex_norm();
        if max_norm > params.size_threshold {
            let shrink = params.target_radius / max_norm;
            info!(
                factor = max_norm / params.target_radius,
                "object is very large, down-scaling"
            );
            mesh.scale(shrink);
            if let Some(h) = &mut handle {
                h.scale(shrink);
            }
            scale *= shrink;
        }

        let reference = handle.as_ref().unwrap_or(&mesh);
        let offset = Aabb::from_points(&reference.vertices).center().coords;
        mesh.translate(-offset);

        let densified = subdivide_mesh(
            &mesh,
            &SubdivideParams::until_vertex_count(params.sample_count)
                .with_max_passes(params.max_subdivision_passes),
        )?;
        debug!(
            passes = densified.passes,
            vertices = densified.mesh.vertices.len(),
            "densified object mesh"
        );

        Ok(Self {
            subdivision_passes: densified.passes,
            mesh: densified.mesh,
            scale,
            offset,
        })
    }

    /// The prepared, unrotated mesh.
    #[must_use]
    pub const fn mesh(&self) -> &IndexedMesh {
        &self.mesh
    }

    /// Total factor applied to the raw coordinates.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Centering offset subtracted after scaling.
    #[must_use]
    pub const fn offset(&self) -> Vector3<f64> {
        self.offset
    }

    /// Subdivision passes applied during preparation.
    #[must_use]
    pub const fn subdivision_passes(&self) -> u32 {
        self.subdivision_passes
    }
}

pub(crate) fn check_mesh(mesh: &IndexedMesh, what: &'static str) -> SampleResult<()> {
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(SampleError::EmptyMesh(what));
    }
    if !mesh.has_valid_indices() {
        return Err(SampleError::InvalidIndices(what));
    }
    Ok(())
}
