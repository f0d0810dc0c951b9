//! Pseudo contact signal and the optional learned contact predictor.

use mesh_types::Point3;

use crate::error::{RefineError, RefineResult};

/// Distance scale of the pseudo contact signal, per metre.
pub const CONTACT_SHARPNESS: f64 = 100.0;

/// Logistic sigmoid, stable for large `|x|`.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Smooth contact signal of a distance in metres.
///
/// `c(d) = 1 − 2(σ(2·100·d) − 0.5)`: equal to 1 at contact, decaying to 0
/// within a couple of centimetres.
///
/// ```
/// use grasp_refine::pseudo_contact;
///
/// assert!((pseudo_contact(0.0) - 1.0).abs() < 1e-12);
/// assert!(pseudo_contact(0.05) < 1e-3);
/// ```
#[must_use]
pub fn pseudo_contact(distance: f64) -> f64 {
    2.0 - 2.0 * sigmoid(2.0 * CONTACT_SHARPNESS * distance)
}

/// Derivative of [`pseudo_contact`] with respect to the distance.
#[must_use]
pub fn pseudo_contact_derivative(distance: f64) -> f64 {
    let s = sigmoid(2.0 * CONTACT_SHARPNESS * distance);
    -4.0 * CONTACT_SHARPNESS * s * (1.0 - s)
}

/// A model that predicts where on the object a hand should touch.
///
/// Features are object sample rows `(x, y, z, 0.2248)`; the output holds one
/// non-negative score per object point.
pub trait ContactPredictor: Send + Sync {
    /// Predict a raw contact map.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures as
    /// [`RefineError::Predictor`].
    fn predict(&self, features: &[[f64; 4]], hand_vertices: &[Point3<f64>]) -> RefineResult<Vec<f64>>;
}

/// Run a predictor and normalize its output by its maximum.
///
/// An all-zero prediction stays zero.
///
/// # Errors
///
/// Returns [`RefineError::Predictor`] when the predictor fails, returns the
/// wrong number of values or any non-finite value.
pub fn reference_contact_map(
    predictor: &dyn ContactPredictor,
    features: &[[f64; 4]],
    hand_vertices: &[Point3<f64>],
) -> RefineResult<Vec<f64>> {
    let mut map = predictor.predict(features, hand_vertices)?;
    if map.len() != features.len() {
        return Err(RefineError::Predictor(format!(
            "predicted {} values for {} points",
            map.len(),
            features.len()
        )));
    }
    if map.iter().any(|v| !v.is_finite()) {
        return Err(RefineError::Predictor("non-finite prediction".into()));
    }
    let max = map.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for v in &mut map {
            *v /= max;
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Fixed(Vec<f64>);

    impl ContactPredictor for Fixed {
        fn predict(&self, _: &[[f64; 4]], _: &[Point3<f64>]) -> RefineResult<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn pseudo_contact_range() {
        assert_relative_eq!(pseudo_contact(0.0), 1.0);
        let mut last = 1.0;
        for i in 1..50 {
            let c = pseudo_contact(f64::from(i) * 1e-3);
            assert!(c > 0.0 && c < last);
            last = c;
        }
        assert!(pseudo_contact(1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        for d in [0.0, 0.002, 0.01, 0.03] {
            let h = 1e-7;
            let numeric = (pseudo_contact(d + h) - pseudo_contact(d - h)) / (2.0 * h);
            assert_relative_eq!(pseudo_contact_derivative(d), numeric, max_relative = 1e-5, epsilon = 1e-9);
        }
    }

    #[test]
    fn sigmoid_is_stable() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-800.0).is_finite());
        assert!(sigmoid(800.0).is_finite());
    }

    #[test]
    fn normalizes_by_maximum() {
        let features = vec![[0.0, 0.0, 0.0, 0.2248]; 3];
        let map = reference_contact_map(&Fixed(vec![1.0, 4.0, 2.0]), &features, &[]).unwrap();
        assert_eq!(map, vec![0.25, 1.0, 0.5]);

        let zeros = reference_contact_map(&Fixed(vec![0.0; 3]), &features, &[]).unwrap();
        assert_eq!(zeros, vec![0.0; 3]);
    }

    #[test]
    fn rejects_bad_predictions() {
        let features = vec![[0.0; 4]; 2];
        assert!(reference_contact_map(&Fixed(vec![1.0]), &features, &[]).is_err());
        assert!(reference_contact_map(&Fixed(vec![1.0, f64::NAN]), &features, &[]).is_err());
    }
}
