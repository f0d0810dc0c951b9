//! Acceptance decision over the full validation chain.

use grasp_types::ValidityRecord;
use mesh_sdf::SignedDistanceField;
use mesh_types::IndexedMesh;
use tracing::debug;

use crate::contact::detect_contact;
use crate::error::ValidateResult;
use crate::params::ValidateParams;
use crate::penetration::penetration_volume;
use crate::simulate::{PhysicalValidator, Simulator};

/// Limits a grasp must stay under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Maximum penetration fraction (exclusive).
    pub penetration_volume: f64,
    /// Maximum displacement in metres (exclusive).
    pub displacement: f64,
}

/// `penetration_volume < T_vol && displacement < T_disp && contact`.
///
/// ```
/// use grasp_validate::{accept, Thresholds};
///
/// let t = Thresholds { penetration_volume: 0.01, displacement: 0.03 };
/// assert!(accept(0.005, 0.001, true, t));
/// assert!(!accept(0.005, 0.001, false, t));
/// assert!(!accept(0.01, 0.001, true, t));
/// ```
#[must_use]
pub fn accept(penetration_volume: f64, displacement: f64, contact: bool, thresholds: Thresholds) -> bool {
    penetration_volume < thresholds.penetration_volume && displacement < thresholds.displacement && contact
}

/// Runs the geometric checks and the simulator on refined grasps.
pub struct GraspValidator<'s> {
    params: ValidateParams,
    physics: PhysicalValidator<'s>,
}

impl<'s> GraspValidator<'s> {
    /// Create a validator.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` fail validation.
    pub fn new(params: ValidateParams, simulator: &'s dyn Simulator) -> ValidateResult<Self> {
        params.validate()?;
        Ok(Self {
            physics: PhysicalValidator::new(simulator, params.fallback_displacement),
            params,
        })
    }

    /// Validator configuration.
    #[must_use]
    pub const fn params(&self) -> &ValidateParams {
        &self.params
    }

    /// Validate a hand mesh against an object mesh.
    ///
    /// Simulator failures are absorbed into the record; geometric failures
    /// are returned.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty hand or object mesh, or if the hand
    /// voxelizes to nothing.
    pub fn validate(
        &self,
        hand: &IndexedMesh,
        object: &IndexedMesh,
        penetration_threshold: f64,
    ) -> ValidateResult<ValidityRecord> {
        let field = SignedDistanceField::new(object.clone())?;
        let penetration = penetration_volume(hand, &field, &self.params)?;
        let contact = detect_contact(&hand.vertices, &field, &self.params)?;
        let displacement = self.physics.measure(hand, object);

        let thresholds = Thresholds {
            penetration_volume: penetration_threshold,
            displacement: self.params.displacement_threshold,
        };
        let record = ValidityRecord {
            penetration_volume: penetration.fraction(),
            contact: contact.contact,
            touching_vertices: contact.touching_vertices,
            displacement: displacement.value,
            displacement_fallback: displacement.fallback,
            accept: accept(penetration.fraction(), displacement.value, contact.contact, thresholds),
        };
        debug!(%record, "validated grasp");
        Ok(record)
    }
}
