//! Core mesh types for the grasp refinement workspace.
//!
//! Geometry shared by every other crate in the workspace:
//!
//! - [`IndexedMesh`] - A triangle mesh with indexed vertex positions
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`MeshTopology`] / [`MeshBounds`] - Read-only mesh access traits
//!
//! The crate depends on `nalgebra` only and knows nothing about hands,
//! grasps or simulators.
//!
//! Coordinates are `f64` in whatever unit the caller uses; the grasp crates
//! work in metres after asset scaling. Faces wind counter-clockwise seen from
//! outside, so [`Triangle::normal`] points out of a closed mesh.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Point3, MeshTopology};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
//! mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
//! mesh.vertices.push(Point3::new(0.5, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod mesh;
mod traits;
mod triangle;

pub use bounds::Aabb;
pub use mesh::{axis_aligned_box, unit_cube, IndexedMesh};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;

pub use nalgebra::{Matrix3, Point3, Vector3};
