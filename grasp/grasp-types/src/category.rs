//! Tool categories and their loss weights and penetration thresholds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraspTypesError;

/// Object category. Selects loss weights and the penetration-volume threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Disk placer (composite object with a separate handle mesh).
    DiskPlacer,
    /// Friem.
    Friem,
    /// Ultrasound probe.
    UltrasoundProbe,
    /// Any other tool.
    #[default]
    Generic,
}

impl ToolCategory {
    /// Every category, in table order.
    pub const ALL: [Self; 4] = [
        Self::DiskPlacer,
        Self::Friem,
        Self::UltrasoundProbe,
        Self::Generic,
    ];

    /// Snake-case name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiskPlacer => "disk_placer",
            Self::Friem => "friem",
            Self::UltrasoundProbe => "ultrasound_probe",
            Self::Generic => "generic",
        }
    }

    /// Reference weights and threshold for this category.
    #[must_use]
    pub const fn profile(self) -> CategoryProfile {
        let (contact, penetration, threshold) = match self {
            Self::DiskPlacer => (60.0, 300.0, 0.03),
            Self::Friem => (20.0, 300.0, 0.01),
            Self::UltrasoundProbe => (20.0, 300.0, 0.02),
            Self::Generic => (100.0, 30.0, 0.01),
        };
        CategoryProfile {
            weights: LossWeights {
                contact,
                consistency: 0.0,
                penetration,
                keypoint: 10.0,
                finger_contact: 0.0,
            },
            penetration_threshold: threshold,
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolCategory {
    type Err = GraspTypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == normalized || c.name().replace('_', "") == normalized)
            .ok_or_else(|| GraspTypesError::UnknownCategory(s.to_string()))
    }
}

/// Weights of the composite refinement loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossWeights {
    /// Contact-map agreement.
    pub contact: f64,
    /// Object/hand contact consistency.
    pub consistency: f64,
    /// Hand vertices inside the object.
    pub penetration: f64,
    /// Deviation from the initial joints and fingertips.
    pub keypoint: f64,
    /// Fingertips away from the object.
    pub finger_contact: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        ToolCategory::Generic.profile().weights
    }
}

impl LossWeights {
    /// Only the keypoint term active.
    #[must_use]
    pub const fn keypoint_only(keypoint: f64) -> Self {
        Self {
            contact: 0.0,
            consistency: 0.0,
            penetration: 0.0,
            keypoint,
            finger_contact: 0.0,
        }
    }

    /// Set the penetration weight.
    #[must_use]
    pub const fn with_penetration(mut self, penetration: f64) -> Self {
        self.penetration = penetration;
        self
    }

    /// Set the contact weight.
    #[must_use]
    pub const fn with_contact(mut self, contact: f64) -> Self {
        self.contact = contact;
        self
    }

    /// Set the finger-contact weight.
    #[must_use]
    pub const fn with_finger_contact(mut self, finger_contact: f64) -> Self {
        self.finger_contact = finger_contact;
        self
    }

    /// Whether every weight is finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            self.contact,
            self.consistency,
            self.penetration,
            self.keypoint,
            self.finger_contact,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Loss weights plus acceptance threshold for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    /// Composite loss weights.
    pub weights: LossWeights,
    /// Penetration-volume fraction below which a grasp may be accepted.
    pub penetration_threshold: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table() {
        let disk = ToolCategory::DiskPlacer.profile();
        assert_eq!(disk.weights.contact, 60.0);
        assert_eq!(disk.weights.penetration, 300.0);
        assert_eq!(disk.penetration_threshold, 0.03);

        let friem = ToolCategory::Friem.profile();
        assert_eq!(friem.weights.contact, 20.0);
        assert_eq!(friem.penetration_threshold, 0.01);

        let probe = ToolCategory::UltrasoundProbe.profile();
        assert_eq!(probe.weights.contact, 20.0);
        assert_eq!(probe.penetration_threshold, 0.02);

        let generic = ToolCategory::Generic.profile();
        assert_eq!(generic.weights.contact, 100.0);
        assert_eq!(generic.weights.penetration, 30.0);
        assert_eq!(generic.penetration_threshold, 0.01);

        for category in ToolCategory::ALL {
            let w = category.profile().weights;
            assert_eq!(w.keypoint, 10.0);
            assert_eq!(w.consistency, 0.0);
            assert_eq!(w.finger_contact, 0.0);
            assert!(w.is_valid());
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("friem".parse::<ToolCategory>().unwrap(), ToolCategory::Friem);
        assert_eq!(
            "Disk-Placer".parse::<ToolCategory>().unwrap(),
            ToolCategory::DiskPlacer
        );
        assert_eq!(
            "ultrasoundprobe".parse::<ToolCategory>().unwrap(),
            ToolCategory::UltrasoundProbe
        );
        assert!("scalpel".parse::<ToolCategory>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for category in ToolCategory::ALL {
            assert_eq!(category.to_string().parse::<ToolCategory>().unwrap(), category);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ToolCategory::UltrasoundProbe).unwrap();
        assert_eq!(json, "\"ultrasound_probe\"");
        let weights: LossWeights = serde_json::from_str(r#"{"contact": 5.0}"#).unwrap();
        assert_eq!(weights.contact, 5.0);
        assert_eq!(weights.penetration, 30.0);
    }

    #[test]
    fn negative_weight_is_invalid() {
        assert!(!LossWeights::default().with_penetration(-1.0).is_valid());
        assert!(!LossWeights::default().with_contact(f64::NAN).is_valid());
    }
}
