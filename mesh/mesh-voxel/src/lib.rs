//! Sparse voxel occupancy for triangle meshes.
//!
//! - [`VoxelCoord`]: signed integer cell coordinates
//! - [`VoxelGrid`]: hash-set occupancy on a lattice anchored at the origin
//! - [`voxelize_surface`]: mark the cells a mesh surface passes through
//!
//! # Example
//!
//! ```
//! use mesh_types::{axis_aligned_box, Point3};
//! use mesh_voxel::voxelize_surface;
//!
//! let hand = axis_aligned_box(Point3::new(0.0, 0.0, 0.0), Point3::new(0.08, 0.02, 0.02));
//! let grid = voxelize_surface(&hand, 0.01).unwrap();
//! let centers = grid.centers();
//! assert_eq!(centers.len(), grid.len());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod coord;
mod error;
mod grid;
mod voxelize;

pub use coord::VoxelCoord;
pub use error::{VoxelError, VoxelResult};
pub use grid::VoxelGrid;
pub use voxelize::voxelize_surface;
