//! Mesh simplification using quadric error metrics.
//!
//! [`decimate_mesh`] collapses edges cheapest-first, placing each merged
//! vertex at the point minimizing the summed squared distance to the planes
//! of the faces it replaces (Garland and Heckbert).
//!
//! - target by triangle count or by ratio
//! - manifold-preserving link condition
//! - optional boundary locking, face-flip rejection and error cap
//!
//! # Layer 0
//!
//! Depends on `mesh-types`, `nalgebra`, `hashbrown` and `smallvec` only.
//!
//! # Example
//!
//! ```
//! use mesh_decimate::{decimate_mesh, DecimateParams};
//! use mesh_types::unit_cube;
//!
//! let result = decimate_mesh(&unit_cube(), &DecimateParams::with_target_ratio(0.5)).unwrap();
//! println!("{result}");
//! assert!(result.mesh.has_valid_indices());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod decimate;
mod error;
mod params;
mod quadric;
mod result;

pub use decimate::decimate_mesh;
pub use error::{DecimateError, DecimateResult};
pub use params::DecimateParams;
pub use quadric::Quadric;
pub use result::DecimationResult;
