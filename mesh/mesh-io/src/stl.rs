//! STL (Stereolithography) loading.
//!
//! Supports both ASCII and binary STL. STL stores an unindexed triangle
//! soup, so the loader welds bit-identical positions back into shared
//! vertices. Tool assets exported from CAD are usually STL, and the
//! containment and subdivision passes need shared vertices to see a
//! closed surface.
//!
//! # Format Detection
//!
//! - ASCII files start with "solid" (after optional whitespace) and contain
//!   no NUL bytes in the first 80 bytes
//! - Everything else is treated as binary: an 80-byte header, a `u32` face
//!   count, then 50 bytes per triangle

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Load a mesh from an STL file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - A binary file is shorter than its face count declares
/// - An ASCII vertex line has unparsable coordinates
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    let mut reader = BufReader::new(file);

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mesh = parse_stl(&bytes)?;
    debug!(
        path = %path.display(),
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "loaded STL"
    );
    Ok(mesh)
}

/// Parse STL from an in-memory buffer.
pub(crate) fn parse_stl(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if bytes.len() < 6 {
        return Err(IoError::invalid_content("file too small to be valid STL"));
    }

    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    let looks_ascii = String::from_utf8_lossy(head).trim_start().starts_with("solid")
        && !head.contains(&0);

    if looks_ascii {
        parse_ascii(BufReader::new(bytes))
    } else {
        parse_binary(bytes)
    }
}

fn parse_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(IoError::invalid_content(format!(
            "binary STL header needs {} bytes, got {}",
            HEADER_SIZE + 4,
            bytes.len()
        )));
    }

    let face_count = u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ]);

    let body = &bytes[HEADER_SIZE + 4..];
    let mut welder = Welder::with_capacity(face_count as usize);

    for chunk in body.chunks_exact(TRIANGLE_SIZE).take(face_count as usize) {
        // Skip the 12-byte normal.
        let corners = [
            read_point(&chunk[12..24]),
            read_point(&chunk[24..36]),
            read_point(&chunk[36..48]),
        ];
        welder.push_triangle(corners);
    }

    let got = welder.mesh.faces.len();
    if got < face_count as usize {
        #[allow(clippy::cast_possible_truncation)]
        // got < face_count, which is a u32
        return Err(IoError::TruncatedStl {
            expected: face_count,
            got: got as u32,
        });
    }

    Ok(welder.mesh)
}

fn read_point(buf: &[u8]) -> Point3<f64> {
    let f = |o: usize| f64::from(f32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]));
    Point3::new(f(0), f(4), f(8))
}

fn parse_ascii<R: BufRead>(reader: R) -> IoResult<IndexedMesh> {
    let mut welder = Welder::with_capacity(0);
    let mut in_loop = false;
    let mut corners: Vec<Point3<f64>> = Vec::with_capacity(3);

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let mut coord = || -> IoResult<f64> {
                    let token = parts.next().ok_or_else(|| {
                        IoError::invalid_content("vertex line has fewer than 3 coordinates")
                    })?;
                    Ok(token.parse()?)
                };
                let p = Point3::new(coord()?, coord()?, coord()?);
                corners.push(p);
            }
            "endloop" => {
                in_loop = false;
                if let [a, b, c] = corners[..] {
                    welder.push_triangle([a, b, c]);
                }
            }
            "endsolid" => break,
            _ => {}
        }
    }

    Ok(welder.mesh)
}

/// Welds identical corner positions into shared vertices.
struct Welder {
    mesh: IndexedMesh,
    lookup: HashMap<[u64; 3], u32>,
}

impl Welder {
    fn with_capacity(faces: usize) -> Self {
        Self {
            mesh: IndexedMesh::with_capacity(faces / 2, faces),
            lookup: HashMap::with_capacity(faces / 2),
        }
    }

    fn index_of(&mut self, p: Point3<f64>) -> u32 {
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        let vertices = &mut self.mesh.vertices;
        *self.lookup.entry(key).or_insert_with(|| {
            #[allow(clippy::cast_possible_truncation)]
            // Mesh sizes stay far below u32::MAX
            let index = vertices.len() as u32;
            vertices.push(p);
            index
        })
    }

    fn push_triangle(&mut self, [a, b, c]: [Point3<f64>; 3]) {
        let face = [self.index_of(a), self.index_of(b), self.index_of(c)];
        self.mesh.faces.push(face);
    }
}
