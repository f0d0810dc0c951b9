//! Physical-plausibility checks for refined grasps.
//!
//! A refined hand is accepted when it barely penetrates the object, touches
//! it, and survives a simulated drop:
//!
//! - [`penetration_volume`] - decimate, voxelize, count voxel centers inside
//! - [`classify_points`] / [`surface_distances`] - batched ray-cast signs
//!   and nearest-surface distances
//! - [`detect_contact`] - at least one vertex inside or within tolerance
//! - [`PhysicalValidator`] - simulator call with a fallback on any failure
//! - [`accept`] / [`GraspValidator`] - the combined decision
//!
//! # Example
//!
//! ```
//! use grasp_validate::{DisabledSimulator, GraspValidator, ValidateParams};
//! use mesh_types::{axis_aligned_box, Point3};
//!
//! let object = axis_aligned_box(Point3::new(-0.05, -0.05, -0.05), Point3::new(0.05, 0.05, 0.05));
//! let hand = axis_aligned_box(Point3::new(0.2, 0.0, 0.0), Point3::new(0.24, 0.04, 0.04));
//!
//! let validator = GraspValidator::new(ValidateParams::default(), &DisabledSimulator).unwrap();
//! let record = validator.validate(&hand, &object, 0.01).unwrap();
//! assert_eq!(record.penetration_volume, 0.0);
//! assert!(!record.contact);
//! assert!(record.displacement_fallback);
//! assert!(!record.accept);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod contact;
mod containment;
mod error;
mod params;
mod penetration;
mod simulate;
mod validate;

pub use contact::{detect_contact, ContactReport};
pub use containment::{classify_points, surface_distances, Side};
pub use error::{SimulationError, ValidateError, ValidateResult};
pub use params::ValidateParams;
pub use penetration::{penetration_volume, PenetrationEstimate};
pub use simulate::{DisabledSimulator, Displacement, PhysicalValidator, Simulator};
pub use validate::{accept, GraspValidator, Thresholds};
