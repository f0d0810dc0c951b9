//! Mesh file I/O.
//!
//! Loading and saving of triangle meshes in the formats the grasp pipeline
//! touches:
//!
//! - **PLY** (Polygon File Format) - load (ASCII and binary) and save
//! - **STL** (Stereolithography) - load (ASCII and binary)
//!
//! # Format Detection
//!
//! [`load_mesh`] picks the reader from the file extension:
//!
//! ```no_run
//! use mesh_io::load_mesh;
//!
//! let tool = load_mesh("assets/friem.stl").unwrap();
//! let hand = load_mesh("test_meshes/000000_Hand.ply").unwrap();
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod ply;
mod stl;

pub use error::{IoError, IoResult};
pub use ply::{load_ply, save_ply};
pub use stl::load_stl;

use std::path::Path;

use mesh_types::IndexedMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// STL, binary or ASCII.
    Stl,
    /// PLY, binary or ASCII.
    Ply,
}

impl MeshFormat {
    /// Detect format from file extension (case-insensitive).
    ///
    /// Returns `None` if the extension is missing or not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "ply" => Some(Self::Ply),
            _ => None,
        }
    }

}

/// Load a mesh from a file, detecting format from extension.
///
/// # Errors
///
/// Returns [`IoError::UnknownFormat`] for an unrecognized extension, and
/// otherwise whatever the format reader returns.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    match MeshFormat::from_path(path) {
        Some(MeshFormat::Stl) => load_stl(path),
        Some(MeshFormat::Ply) => load_ply(path),
        None => Err(IoError::UnknownFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        }),
    }
}
