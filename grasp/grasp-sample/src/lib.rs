//! Object preparation and surface sampling for grasp refinement.
//!
//! An [`ObjectAsset`] is loaded and prepared once per run (scaled to metres,
//! shrunk if oversized, centered on its bounding box or its handle's, and
//! densified by midpoint subdivision). [`sample_object`] then rotates it
//! into each candidate's frame and draws a seeded, area-weighted surface
//! sample with outward normals.
//!
//! # Example
//!
//! ```
//! use grasp_sample::{sample_object, ObjectAsset, SampleParams};
//! use mesh_types::{axis_aligned_box, Point3};
//! use nalgebra::Rotation3;
//!
//! let params = SampleParams::default().with_sample_count(300);
//! let raw = axis_aligned_box(Point3::new(0.0, 0.0, 0.0), Point3::new(120.0, 30.0, 30.0));
//! let asset = ObjectAsset::prepare(raw, None, &params).unwrap();
//!
//! let rotation = Rotation3::from_euler_angles(0.1, 0.2, 0.3);
//! let sample = sample_object(&asset, rotation.matrix(), &params).unwrap();
//! assert_eq!(sample.len(), 300);
//! assert!(sample.points.iter().all(|p| p.coords.norm() <= sample.bounding_radius() + 1e-12));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod asset;
mod error;
mod params;
mod sampler;

pub use asset::ObjectAsset;
pub use error::{SampleError, SampleResult};
pub use params::SampleParams;
pub use sampler::{sample_object, sample_surface};
