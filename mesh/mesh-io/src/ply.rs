//! PLY (Polygon File Format) support.
//!
//! Hand meshes arrive as PLY next to the input batch, and every persisted
//! hand and object mesh is written as PLY.
//!
//! # Supported Properties
//!
//! - Vertex positions (x, y, z), `float` or `double` - required
//! - Face vertex indices (`vertex_indices` or `vertex_index`); polygons are
//!   fan-triangulated
//!
//! All other elements and properties (normals, colors, texture coordinates)
//! are ignored on load.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_ply, save_ply};
//!
//! let mesh = load_ply("00000_Hand.ply").unwrap();
//! save_ply(&mesh, "copy.ply", true).unwrap();
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Point3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use tracing::debug;

use crate::error::{IoError, IoResult};

const COMMENT: &str = "written by grasp-refine mesh-io";

/// Load a mesh from a PLY file.
///
/// Supports ASCII, binary little-endian, and binary big-endian encodings.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] for a missing file,
/// [`IoError::IndexOutOfRange`] for a face pointing past the vertex list, and
/// [`IoError::InvalidContent`] for anything ply-rs cannot parse or a vertex
/// without numeric coordinates.
pub fn load_ply<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let header = parser
        .read_header(&mut reader)
        .map_err(|e| IoError::invalid_content(format!("failed to parse PLY header: {e}")))?;
    let payload = parser
        .read_payload(&mut reader, &header)
        .map_err(|e| IoError::invalid_content(format!("failed to read PLY payload: {e}")))?;

    let mut mesh = IndexedMesh::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        mesh.vertices.reserve(vertex_elements.len());
        for (i, element) in vertex_elements.iter().enumerate() {
            let coord = |key: &str| {
                scalar_property(element, key).ok_or_else(|| {
                    IoError::invalid_content(format!("vertex {i} has no numeric '{key}'"))
                })
            };
            mesh.vertices
                .push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
        }
    }

    if let Some(face_elements) = payload.get("face") {
        mesh.faces.reserve(face_elements.len());
        let vertex_count = mesh.vertices.len();
        for (face, element) in face_elements.iter().enumerate() {
            let indices = index_list(element);
            if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(IoError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
            if indices.len() >= 3 {
                #[allow(clippy::cast_possible_truncation)]
                // Indices were bounds-checked against a Vec length above
                for i in 1..indices.len() - 1 {
                    mesh.faces
                        .push([indices[0] as u32, indices[i] as u32, indices[i + 1] as u32]);
                }
            }
        }
    }

    debug!(
        path = %path.display(),
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "loaded PLY"
    );
    Ok(mesh)
}

/// Read a numeric scalar property as `f64`.
fn scalar_property(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(f64::from(*v)),
        Property::UInt(v) => Some(f64::from(*v)),
        Property::Short(v) => Some(f64::from(*v)),
        Property::UShort(v) => Some(f64::from(*v)),
        Property::Char(v) => Some(f64::from(*v)),
        Property::UChar(v) => Some(f64::from(*v)),
        _ => None,
    }
}

/// Extract the vertex index list from a face element.
///
/// Negative indices map to `usize::MAX` so they fail the range check.
fn index_list(element: &DefaultElement) -> Vec<usize> {
    fn signed(i: i64) -> usize {
        usize::try_from(i).unwrap_or(usize::MAX)
    }

    for key in ["vertex_indices", "vertex_index"] {
        let Some(prop) = element.get(key) else {
            continue;
        };
        return match prop {
            Property::ListInt(v) => v.iter().map(|&i| signed(i64::from(i))).collect(),
            Property::ListUInt(v) => v.iter().map(|&i| i as usize).collect(),
            Property::ListShort(v) => v.iter().map(|&i| signed(i64::from(i))).collect(),
            Property::ListUShort(v) => v.iter().map(|&i| usize::from(i)).collect(),
            Property::ListChar(v) => v.iter().map(|&i| signed(i64::from(i))).collect(),
            Property::ListUChar(v) => v.iter().map(|&i| usize::from(i)).collect(),
            _ => continue,
        };
    }
    Vec::new()
}

/// Save a mesh to a PLY file.
///
/// Vertex coordinates are written as `double`, so a save/load cycle is
/// lossless. `binary` selects little-endian binary over ASCII.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_ply<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, binary: bool) -> IoResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let encoding = if binary {
        "binary_little_endian"
    } else {
        "ascii"
    };
    write_header(mesh, encoding, &mut writer)?;
    if binary {
        write_binary_body(mesh, &mut writer)?;
    } else {
        write_ascii_body(mesh, &mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

// ply-rs emits the element count instead of the list length for binary list
// properties, so both encodings are written directly.
fn write_header<W: Write>(mesh: &IndexedMesh, encoding: &str, w: &mut W) -> IoResult<()> {
    write!(
        w,
        "ply\nformat {encoding} 1.0\ncomment {COMMENT}\n\
         element vertex {}\nproperty double x\nproperty double y\nproperty double z\n\
         element face {}\nproperty list uchar uint vertex_indices\nend_header\n",
        mesh.vertices.len(),
        mesh.faces.len()
    )?;
    Ok(())
}

fn write_binary_body<W: Write>(mesh: &IndexedMesh, w: &mut W) -> IoResult<()> {
    for v in &mesh.vertices {
        for c in [v.x, v.y, v.z] {
            w.write_all(&c.to_le_bytes())?;
        }
    }
    for face in &mesh.faces {
        w.write_all(&[3u8])?;
        for index in face {
            w.write_all(&index.to_le_bytes())?;
        }
    }
    Ok(())
}

fn write_ascii_body<W: Write>(mesh: &IndexedMesh, w: &mut W) -> IoResult<()> {
    // `{:?}` keeps enough digits to round-trip an f64.
    for v in &mesh.vertices {
        writeln!(w, "{:?} {:?} {:?}", v.x, v.y, v.z)?;
    }
    for [a, b, c] in &mesh.faces {
        writeln!(w, "3 {a} {b} {c}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{unit_cube, MeshTopology};

    #[test]
    fn binary_save_then_load_is_lossless() {
        let mut original = unit_cube();
        original.translate(mesh_types::Vector3::new(0.123_456_789, -1e-7, 3.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.ply");
        save_ply(&original, &path, true).unwrap();
        let loaded = load_ply(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn ascii_save_then_load() {
        let original = unit_cube();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube_ascii.ply");
        save_ply(&original, &path, false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ply\nformat ascii 1.0"));

        let loaded = load_ply(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.face_count(), 12);
        assert_relative_eq!(loaded.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n",
        )
        .unwrap();

        let mesh = load_ply(&path).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_relative_eq!(mesh.surface_area(), 1.0);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n",
        )
        .unwrap();

        let err = load_ply(&path).unwrap_err();
        assert!(matches!(
            err,
            IoError::IndexOutOfRange {
                face: 0,
                index: 7,
                vertex_count: 3
            }
        ));
    }

    #[test]
    fn missing_file() {
        let err = load_ply("definitely_missing_12345.ply").unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
