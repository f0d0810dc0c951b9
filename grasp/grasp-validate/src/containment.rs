//! Batched inside/outside classification and nearest-surface distances.

use mesh_sdf::SignedDistanceField;
use mesh_types::Point3;

use crate::error::{ValidateError, ValidateResult};

/// Which side of the object surface a point is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Outside the object.
    Exterior,
    /// Inside the object.
    Interior,
}

impl Side {
    /// `+1` for exterior, `-1` for interior.
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Exterior => 1,
            Self::Interior => -1,
        }
    }

    /// Whether the point is outside.
    #[must_use]
    pub const fn is_exterior(self) -> bool {
        matches!(self, Self::Exterior)
    }
}

/// Classify points by axis-aligned ray casting, `batch_size` points at a time.
///
/// # Errors
///
/// Returns [`ValidateError::ZeroBatchSize`] if `batch_size` is zero.
pub fn classify_points(
    points: &[Point3<f64>],
    object: &SignedDistanceField,
    batch_size: usize,
) -> ValidateResult<Vec<Side>> {
    if batch_size == 0 {
        return Err(ValidateError::ZeroBatchSize("containment"));
    }
    let mut sides = Vec::with_capacity(points.len());
    for batch in points.chunks(batch_size) {
        sides.extend(object.contains_points(batch).into_iter().map(|inside| {
            if inside { Side::Interior } else { Side::Exterior }
        }));
    }
    Ok(sides)
}

/// Distance from each point to the closest point on the object surface.
///
/// # Errors
///
/// Returns [`ValidateError::ZeroBatchSize`] if `batch_size` is zero.
pub fn surface_distances(
    points: &[Point3<f64>],
    object: &SignedDistanceField,
    batch_size: usize,
) -> ValidateResult<Vec<f64>> {
    if batch_size == 0 {
        return Err(ValidateError::ZeroBatchSize("distance"));
    }
    let mut distances = Vec::with_capacity(points.len());
    for batch in points.chunks(batch_size) {
        distances.extend(object.closest_points(batch).into_iter().map(|hit| hit.distance));
    }
    Ok(distances)
}
