//! Voxel estimate of how much of the hand lies inside the object.

use mesh_decimate::{decimate_mesh, DecimateParams};
use mesh_sdf::SignedDistanceField;
use mesh_types::IndexedMesh;
use mesh_voxel::voxelize_surface;
use tracing::debug;

use crate::error::{ValidateError, ValidateResult};
use crate::params::ValidateParams;

/// Interior and total voxel counts of the hand surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenetrationEstimate {
    /// Voxel centers inside the object.
    pub interior: usize,
    /// All occupied voxel centers.
    pub total: usize,
}

impl PenetrationEstimate {
    /// `interior / total`, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.interior as f64 / self.total as f64
        }
    }
}

/// Estimate the fraction of the hand surface inside the object.
///
/// The hand is decimated to `decimate_ratio` of its faces, voxelized at
/// twice `voxel_pitch`, and the occupied voxel centers are tested for
/// containment in batches of `voxel_batch`.
///
/// # Errors
///
/// Returns an error for an empty hand mesh, zero voxel points, invalid
/// parameters, or a decimation/voxelization failure.
pub fn penetration_volume(
    hand: &IndexedMesh,
    object: &SignedDistanceField,
    params: &ValidateParams,
) -> ValidateResult<PenetrationEstimate> {
    params.validate()?;
    if hand.faces.is_empty() {
        return Err(ValidateError::EmptyHandMesh);
    }

    let decimated = decimate_mesh(hand, &DecimateParams::with_target_ratio(params.decimate_ratio))?;
    let grid = voxelize_surface(&decimated.mesh, params.effective_pitch())?;
    let centers = grid.centers();
    if centers.is_empty() {
        return Err(ValidateError::NoVoxelPoints);
    }

    let interior = centers
        .chunks(params.voxel_batch)
        .map(|batch| object.contains_points(batch).into_iter().filter(|&inside| inside).count())
        .sum();

    let estimate = PenetrationEstimate {
        interior,
        total: centers.len(),
    };
    debug!(
        faces = decimated.final_triangles,
        voxels = estimate.total,
        interior = estimate.interior,
        fraction = estimate.fraction(),
        "penetration volume"
    );
    Ok(estimate)
}
