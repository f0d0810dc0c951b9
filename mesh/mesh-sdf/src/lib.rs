//! Distance and containment queries for closed triangle meshes.
//!
//! [`SignedDistanceField`] wraps a mesh with a [`Bvh`] and answers:
//!
//! - exact closest point and unsigned distance (branch-and-bound over the BVH)
//! - inside/outside by ray parity, majority of +X, +Y, +Z, with rays that
//!   touch an edge or vertex re-cast along a skewed direction
//! - signed distance (negative inside)
//! - parallel slices of the above for many points, in input order
//!
//! # Layer 0
//!
//! Depends on `mesh-types`, `nalgebra`, `rayon` and `smallvec` only.
//!
//! # Example
//!
//! ```
//! use mesh_sdf::SignedDistanceField;
//! use mesh_types::{unit_cube, Point3};
//!
//! let sdf = SignedDistanceField::new(unit_cube()).unwrap();
//! let inside = sdf.contains_points(&[Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 0.5, 0.5)]);
//! assert_eq!(inside, vec![true, false]);
//!
//! let hit = sdf.closest_point(&Point3::new(0.5, 0.5, 1.25));
//! assert!((hit.distance - 0.25).abs() < 1e-12);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bvh;
mod error;
mod query;
mod sdf;

pub use bvh::{Bvh, BvhStats, DEFAULT_MAX_LEAF_SIZE, DEFAULT_PARALLEL_THRESHOLD};
pub use error::{SdfError, SdfResult};
pub use query::{closest_point_on_triangle, ray_triangle_intersect, RayHit};
pub use sdf::{signed_distance, SignedDistanceField, SurfaceHit};
