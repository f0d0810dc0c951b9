//! Parameters for mesh decimation.

use crate::error::{DecimateError, DecimateResult};

/// Parameters for mesh decimation.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimateParams {
    /// Target number of triangles. If `None`, `target_ratio` is used.
    pub target_triangles: Option<usize>,

    /// Fraction of triangles to keep, in `[0, 1]`. Default: 0.5
    pub target_ratio: f64,

    /// Never move vertices that lie on a boundary edge. Default: true
    pub preserve_boundary: bool,

    /// Reject collapses that turn an adjacent face upside down. Default: true
    pub prevent_flips: bool,

    /// Maximum quadric error accepted for a collapse. If `None`, no limit.
    pub max_error: Option<f64>,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.5,
            preserve_boundary: true,
            prevent_flips: true,
            max_error: None,
        }
    }
}

impl DecimateParams {
    /// Params keeping the given fraction of triangles.
    #[must_use]
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio,
            ..Default::default()
        }
    }

    /// Params targeting a specific triangle count.
    #[must_use]
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Set the maximum collapse error.
    #[must_use]
    pub const fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Set boundary preservation.
    #[must_use]
    pub const fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set face-flip rejection.
    #[must_use]
    pub const fn with_prevent_flips(mut self, prevent: bool) -> Self {
        self.prevent_flips = prevent;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecimateError::InvalidRatio`] when no explicit target is set
    /// and `target_ratio` is outside `[0, 1]` or not finite.
    pub fn validate(&self) -> DecimateResult<()> {
        if self.target_triangles.is_none() && !(0.0..=1.0).contains(&self.target_ratio) {
            return Err(DecimateError::InvalidRatio(self.target_ratio));
        }
        Ok(())
    }

    /// Triangle count to stop at for a mesh of `face_count` faces.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn target_for(&self, face_count: usize) -> usize {
        self.target_triangles
            .unwrap_or_else(|| (face_count as f64 * self.target_ratio).ceil() as usize)
            .min(face_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_halve() {
        let params = DecimateParams::default();
        assert_eq!(params.target_for(1538), 769);
        assert_eq!(params.target_for(7), 4);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn explicit_target_wins() {
        let params = DecimateParams::with_target_triangles(100).with_max_error(1e-3);
        assert_eq!(params.target_for(1000), 100);
        assert_eq!(params.target_for(50), 50);
        assert_eq!(params.max_error, Some(1e-3));
    }

    #[test]
    fn bad_ratio_rejected() {
        assert!(DecimateParams::with_target_ratio(1.5).validate().is_err());
        assert!(DecimateParams::with_target_ratio(f64::NAN).validate().is_err());
        assert!(DecimateParams::with_target_ratio(0.0).validate().is_ok());
    }
}
