//! Surface contact between the hand and the object.

use mesh_sdf::SignedDistanceField;
use mesh_types::Point3;

use crate::containment::{classify_points, surface_distances};
use crate::error::ValidateResult;
use crate::params::ValidateParams;

/// Outcome of the contact check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactReport {
    /// At least one vertex touches or enters the object.
    pub contact: bool,
    /// Vertices that are inside the object or within tolerance of its surface.
    pub touching_vertices: usize,
}

/// Flag contact when any hand vertex is not both exterior and farther than
/// `contact_tolerance` from the surface.
///
/// # Errors
///
/// Returns an error if a batch size in `params` is zero.
pub fn detect_contact(
    vertices: &[Point3<f64>],
    object: &SignedDistanceField,
    params: &ValidateParams,
) -> ValidateResult<ContactReport> {
    let sides = classify_points(vertices, object, params.containment_batch)?;
    let distances = surface_distances(vertices, object, params.distance_batch)?;

    let touching_vertices = sides
        .iter()
        .zip(&distances)
        .filter(|&(side, &d)| !(side.is_exterior() && d > params.contact_tolerance))
        .count();

    Ok(ContactReport {
        contact: touching_vertices > 0,
        touching_vertices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    #[test]
    fn far_vertices_do_not_touch() {
        let field = SignedDistanceField::new(unit_cube()).unwrap();
        let report = detect_contact(
            &[Point3::new(1.1, 0.5, 0.5), Point3::new(-0.2, 0.5, 0.5)],
            &field,
            &ValidateParams::default(),
        )
        .unwrap();
        assert_eq!(report, ContactReport { contact: false, touching_vertices: 0 });
    }

    #[test]
    fn near_and_inside_vertices_touch() {
        let field = SignedDistanceField::new(unit_cube()).unwrap();
        let report = detect_contact(
            &[
                Point3::new(1.003, 0.5, 0.5),
                Point3::new(0.5, 0.5, 0.5),
                Point3::new(2.0, 0.5, 0.5),
            ],
            &field,
            &ValidateParams::default(),
        )
        .unwrap();
        assert!(report.contact);
        assert_eq!(report.touching_vertices, 2);
    }

    #[test]
    fn batch_size_does_not_change_report() {
        let field = SignedDistanceField::new(unit_cube()).unwrap();
        let vertices: Vec<_> = (0..40)
            .map(|i| Point3::new(1.0001 + f64::from(i) * 0.0004, 0.25, 0.7))
            .collect();
        let reference = detect_contact(&vertices, &field, &ValidateParams::default()).unwrap();
        // Gaps 0.1 mm to 4.9 mm touch, 5.3 mm and beyond do not.
        assert_eq!(reference.touching_vertices, 13);
        for (c, d) in [(1, 1), (3, 7), (1000, 1000)] {
            let params = ValidateParams::default().with_batches(10_000, c, d);
            assert_eq!(detect_contact(&vertices, &field, &params).unwrap(), reference);
        }
    }
}
