//! Validator configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ValidateError, ValidateResult};

/// Thresholds and batch sizes of the validation chain.
///
/// Batch sizes bound the memory of each geometric pass; they never change
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateParams {
    /// Base voxel pitch in metres. Voxelization uses twice this value.
    pub voxel_pitch: f64,
    /// Fraction of hand faces kept by decimation before voxelization.
    pub decimate_ratio: f64,
    /// Voxel centers per containment batch of the volume estimate.
    pub voxel_batch: usize,
    /// Hand vertices per containment batch of the contact check.
    pub containment_batch: usize,
    /// Hand vertices per nearest-surface batch of the contact check.
    pub distance_batch: usize,
    /// Distance under which an exterior vertex counts as touching.
    pub contact_tolerance: f64,
    /// Displacement at or above which a grasp is rejected.
    pub displacement_threshold: f64,
    /// Displacement recorded when the simulator fails.
    pub fallback_displacement: f64,
}

impl Default for ValidateParams {
    fn default() -> Self {
        Self {
            voxel_pitch: 0.005,
            decimate_ratio: 0.5,
            voxel_batch: 10_000,
            containment_batch: 100,
            distance_batch: 10,
            contact_tolerance: 0.005,
            displacement_threshold: 0.03,
            fallback_displacement: 1e-4,
        }
    }
}

impl ValidateParams {
    /// Set the base voxel pitch.
    #[must_use]
    pub const fn with_voxel_pitch(mut self, pitch: f64) -> Self {
        self.voxel_pitch = pitch;
        self
    }

    /// Set all three batch sizes.
    #[must_use]
    pub const fn with_batches(mut self, voxel: usize, containment: usize, distance: usize) -> Self {
        self.voxel_batch = voxel;
        self.containment_batch = containment;
        self.distance_batch = distance;
        self
    }

    /// Set the contact tolerance.
    #[must_use]
    pub const fn with_contact_tolerance(mut self, tolerance: f64) -> Self {
        self.contact_tolerance = tolerance;
        self
    }

    /// Set the displacement threshold.
    #[must_use]
    pub const fn with_displacement_threshold(mut self, threshold: f64) -> Self {
        self.displacement_threshold = threshold;
        self
    }

    /// Voxel pitch actually used for the hand.
    #[must_use]
    pub fn effective_pitch(&self) -> f64 {
        self.voxel_pitch * 2.0
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::ZeroBatchSize`] for an empty batch and
    /// [`ValidateError::InvalidParams`] for non-positive lengths or a
    /// decimation ratio outside `(0, 1]`.
    pub fn validate(&self) -> ValidateResult<()> {
        for (name, size) in [
            ("voxel", self.voxel_batch),
            ("containment", self.containment_batch),
            ("distance", self.distance_batch),
        ] {
            if size == 0 {
                return Err(ValidateError::ZeroBatchSize(name));
            }
        }
        let positive = [
            ("voxel_pitch", self.voxel_pitch),
            ("contact_tolerance", self.contact_tolerance),
            ("displacement_threshold", self.displacement_threshold),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(ValidateError::InvalidParams(format!(
                "{name} must be positive, got {value}"
            )));
        }
        if !(self.decimate_ratio > 0.0 && self.decimate_ratio <= 1.0) {
            return Err(ValidateError::InvalidParams(format!(
                "decimate_ratio must be in (0, 1], got {}",
                self.decimate_ratio
            )));
        }
        if !self.fallback_displacement.is_finite() {
            return Err(ValidateError::InvalidParams(
                "fallback_displacement must be finite".into(),
            ));
        }
        Ok(())
    }
}
