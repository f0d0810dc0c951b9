//! Data model for grasp refinement and validation.
//!
//! - [`ToolCategory`] and its [`CategoryProfile`] lookup table
//! - [`LossWeights`] and [`LossTerms`] for the composite refinement loss
//! - [`HandPose`] and [`GraspCandidate`] for the optimizer input
//! - [`ObjectSample`] for the prepared object surface
//! - [`ValidityRecord`], [`PersistedGrasp`] and [`BatchReport`] for outcomes
//!
//! # Example
//!
//! ```
//! use grasp_types::{LossTerms, ToolCategory};
//!
//! let profile: grasp_types::CategoryProfile = "friem".parse::<ToolCategory>().unwrap().profile();
//! let terms = LossTerms { penetration: 0.001, keypoint: 0.5, ..LossTerms::default() };
//! assert!((terms.weighted_total(&profile.weights) - 5.3).abs() < 1e-12);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod category;
mod error;
mod loss;
mod pose;
mod record;
mod sample;

pub use category::{CategoryProfile, LossWeights, ToolCategory};
pub use error::{GraspTypesError, GraspTypesResult};
pub use loss::LossTerms;
pub use pose::{check_orthonormal, GraspCandidate, HandPose, BETAS_DIM, ORTHONORMAL_TOLERANCE};
pub use record::{BatchReport, PersistedGrasp, ValidityRecord};
pub use sample::{ObjectSample, FEATURE_CHANNEL};
