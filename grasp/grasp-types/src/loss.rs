//! Per-iteration loss terms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::LossWeights;

/// Unweighted loss terms of one refinement iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossTerms {
    /// Squared depth of hand vertices inside the object.
    pub penetration: f64,
    /// Object-side versus hand-side contact disagreement.
    pub consistency: f64,
    /// Pseudo contact-map versus reference contact-map.
    pub contact: f64,
    /// Fingertips away from the object.
    pub finger_contact: f64,
    /// Joint and fingertip drift from the initial pose.
    pub keypoint: f64,
}

impl LossTerms {
    /// Weighted sum of the terms.
    #[must_use]
    pub fn weighted_total(&self, w: &LossWeights) -> f64 {
        w.contact * self.contact
            + w.consistency * self.consistency
            + w.penetration * self.penetration
            + w.keypoint * self.keypoint
            + w.finger_contact * self.finger_contact
    }

    /// Whether every term is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.penetration,
            self.consistency,
            self.contact,
            self.finger_contact,
            self.keypoint,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl fmt::Display for LossTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "penetration {:9.5}, keypoint {:9.5}, contact {:9.5}",
            self.penetration, self.keypoint, self.contact
        )
    }
}
