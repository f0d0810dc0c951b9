//! Sampler parameters.

use serde::{Deserialize, Serialize};

use crate::error::{SampleError, SampleResult};

/// Object preparation and sampling parameters.
///
/// Defaults reproduce the reference configuration: millimetre assets,
/// 3000 samples, seed 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleParams {
    /// Number of surface samples.
    pub sample_count: usize,
    /// Factor applied to raw asset coordinates.
    pub asset_scale: f64,
    /// Max vertex norm above which the object is shrunk.
    pub size_threshold: f64,
    /// Max vertex norm after shrinking.
    pub target_radius: f64,
    /// Sampling seed.
    pub seed: u64,
    /// Bound on densification passes.
    pub max_subdivision_passes: u32,
    /// Allowed deviation of `RᵀR` from the identity.
    pub rotation_tolerance: f64,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            sample_count: 3000,
            asset_scale: 0.001,
            size_threshold: 1.0,
            target_radius: 0.08,
            seed: 100,
            max_subdivision_passes: 8,
            rotation_tolerance: grasp_types::ORTHONORMAL_TOLERANCE,
        }
    }
}

impl SampleParams {
    /// Set the sample count.
    #[must_use]
    pub const fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the asset scale.
    #[must_use]
    pub const fn with_asset_scale(mut self, scale: f64) -> Self {
        self.asset_scale = scale;
        self
    }

    /// Set the sampling seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::ZeroSamples`] for a zero sample count and
    /// [`SampleError::InvalidParams`] for non-positive scales or radii.
    pub fn validate(&self) -> SampleResult<()> {
        if self.sample_count == 0 {
            return Err(SampleError::ZeroSamples);
        }
        for (name, value) in [
            ("asset_scale", self.asset_scale),
            ("size_threshold", self.size_threshold),
            ("target_radius", self.target_radius),
            ("rotation_tolerance", self.rotation_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SampleError::InvalidParams(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = SampleParams::default();
        assert_eq!(params.sample_count, 3000);
        assert_eq!(params.seed, 100);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(matches!(
            SampleParams::default().with_sample_count(0).validate(),
            Err(SampleError::ZeroSamples)
        ));
        assert!(SampleParams::default().with_asset_scale(0.0).validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: SampleParams = serde_json::from_str(r#"{"sample_count": 500}"#).unwrap();
        assert_eq!(params.sample_count, 500);
        assert_eq!(params.target_radius, 0.08);
    }
}
