//! Midpoint subdivision for triangle meshes.
//!
//! Splits every triangle into four through shared edge midpoints, either a
//! fixed number of times or until a vertex count is reached. Used to densify
//! coarse object meshes before surface sampling.
//!
//! # Example
//!
//! ```
//! use mesh_subdivide::{subdivide_mesh, SubdivideParams};
//! use mesh_types::unit_cube;
//!
//! let result = subdivide_mesh(&unit_cube(), &SubdivideParams::passes(2)).unwrap();
//! assert_eq!(result.mesh.faces.len(), 12 * 16);
//! println!("{result}");
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod params;
mod result;
mod subdivide;

pub use error::{SubdivideError, SubdivideResult};
pub use params::{SubdivideParams, SubdivisionTarget};
pub use result::SubdivisionResult;
pub use subdivide::{subdivide_mesh, subdivide_once};
