//! Edge-collapse driver.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Vector3};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::error::{DecimateError, DecimateResult};
use crate::params::DecimateParams;
use crate::quadric::Quadric;
use crate::result::DecimationResult;

type FaceList = SmallVec<[u32; 8]>;
type VertexList = SmallVec<[u32; 16]>;

/// Optimal points further than this many edge lengths from the edge midpoint
/// are discarded in favour of the best endpoint or midpoint.
const MAX_TARGET_DRIFT: f64 = 2.0;

/// Decimate a mesh by collapsing the cheapest edges first.
///
/// Collapses that would break the manifold structure, flip an adjacent face
/// (when [`DecimateParams::prevent_flips`] is set) or exceed
/// [`DecimateParams::max_error`] are skipped. Decimation stops at the target
/// triangle count or when no acceptable collapse remains.
///
/// # Errors
///
/// Returns [`DecimateError::EmptyMesh`] for a mesh without faces,
/// [`DecimateError::InvalidRatio`] for a ratio outside `[0, 1]` and
/// [`DecimateError::InvalidFaceIndex`] for out-of-range face indices.
///
/// # Example
///
/// ```
/// use mesh_decimate::{decimate_mesh, DecimateParams};
/// use mesh_types::unit_cube;
///
/// let result = decimate_mesh(&unit_cube(), &DecimateParams::default()).unwrap();
/// assert!(result.final_triangles <= 12);
/// ```
pub fn decimate_mesh(
    mesh: &IndexedMesh,
    params: &DecimateParams,
) -> DecimateResult<DecimationResult> {
    if mesh.faces.is_empty() {
        return Err(DecimateError::EmptyMesh);
    }
    params.validate()?;

    let original_triangles = mesh.faces.len();
    let target = params.target_for(original_triangles);
    let mut collapser = Collapser::new(mesh, params)?;
    let collapses_performed = collapser.run(target);
    let collapses_rejected = collapser.rejected;
    let decimated = collapser.into_mesh();

    info!(
        original = original_triangles,
        target,
        final_triangles = decimated.faces.len(),
        collapses = collapses_performed,
        rejected = collapses_rejected,
        "decimated mesh"
    );

    Ok(DecimationResult {
        final_triangles: decimated.faces.len(),
        mesh: decimated,
        original_triangles,
        collapses_performed,
        collapses_rejected,
    })
}

/// A queued edge collapse. Ordered so the heap pops the cheapest first.
#[derive(Debug, Clone, Copy)]
struct Collapse {
    cost: f64,
    keep: u32,
    remove: u32,
    target: Point3<f64>,
    stamps: (u32, u32),
}

impl PartialEq for Collapse {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Collapse {}

impl PartialOrd for Collapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Collapse {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| (other.keep, other.remove).cmp(&(self.keep, self.remove)))
    }
}

struct Collapser<'a> {
    params: &'a DecimateParams,
    positions: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
    face_alive: Vec<bool>,
    vertex_faces: Vec<FaceList>,
    quadrics: Vec<Quadric>,
    stamps: Vec<u32>,
    locked: Vec<bool>,
    live_faces: usize,
    rejected: usize,
}

impl<'a> Collapser<'a> {
    fn new(mesh: &IndexedMesh, params: &'a DecimateParams) -> DecimateResult<Self> {
        let vertex_count = mesh.vertices.len();
        let mut vertex_faces = vec![FaceList::new(); vertex_count];
        let mut quadrics = vec![Quadric::default(); vertex_count];
        let mut edge_use: HashMap<(u32, u32), u32> = HashMap::new();

        for (fi, face) in mesh.faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(DecimateError::InvalidFaceIndex {
                    face: fi,
                    index,
                    vertex_count,
                });
            }
            #[allow(clippy::cast_possible_truncation)]
            let fid = fi as u32;
            let [a, b, c] = face.map(|i| mesh.vertices[i as usize]);
            let plane = (b - a)
                .cross(&(c - a))
                .try_normalize(f64::MIN_POSITIVE)
                .map(|n| Quadric::from_point_normal(&a, &n));
            for k in 0..3 {
                let v = face[k] as usize;
                vertex_faces[v].push(fid);
                if let Some(q) = plane {
                    quadrics[v] += q;
                }
                *edge_use.entry(edge_key(face[k], face[(k + 1) % 3])).or_insert(0) += 1;
            }
        }

        let mut locked = vec![false; vertex_count];
        if params.preserve_boundary {
            for (&(a, b), _) in edge_use.iter().filter(|&(_, &n)| n == 1) {
                locked[a as usize] = true;
                locked[b as usize] = true;
            }
        }
        debug!(
            vertices = vertex_count,
            faces = mesh.faces.len(),
            locked = locked.iter().filter(|&&l| l).count(),
            "prepared decimation"
        );

        Ok(Self {
            params,
            positions: mesh.vertices.clone(),
            faces: mesh.faces.clone(),
            face_alive: vec![true; mesh.faces.len()],
            vertex_faces,
            quadrics,
            stamps: vec![0; vertex_count],
            locked,
            live_faces: mesh.faces.len(),
            rejected: 0,
        })
    }

    fn run(&mut self, target: usize) -> usize {
        let mut edges: Vec<(u32, u32)> = self
            .faces
            .iter()
            .flat_map(|f| [edge_key(f[0], f[1]), edge_key(f[1], f[2]), edge_key(f[2], f[0])])
            .collect();
        edges.sort_unstable();
        edges.dedup();

        let mut heap: BinaryHeap<Collapse> = edges
            .into_iter()
            .filter_map(|(a, b)| self.candidate(a, b))
            .collect();

        let mut performed = 0;
        while self.live_faces > target {
            let Some(collapse) = heap.pop() else {
                break;
            };
            if collapse.stamps != (self.stamps[collapse.keep as usize], self.stamps[collapse.remove as usize]) {
                continue;
            }
            if !self.allowed(&collapse) {
                self.rejected += 1;
                continue;
            }
            self.apply(&collapse);
            performed += 1;
            for n in self.neighbors(collapse.keep) {
                if let Some(next) = self.candidate(collapse.keep, n) {
                    heap.push(next);
                }
            }
        }
        performed
    }

    fn live_faces_of(&self, v: u32) -> impl Iterator<Item = u32> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .copied()
            .filter(move |&f| self.face_alive[f as usize] && self.faces[f as usize].contains(&v))
    }

    fn neighbors(&self, v: u32) -> VertexList {
        let mut out = VertexList::new();
        for f in self.live_faces_of(v) {
            for &u in &self.faces[f as usize] {
                if u != v && !out.contains(&u) {
                    out.push(u);
                }
            }
        }
        out
    }

    fn candidate(&self, a: u32, b: u32) -> Option<Collapse> {
        let (la, lb) = (self.locked[a as usize], self.locked[b as usize]);
        let q = self.quadrics[a as usize] + self.quadrics[b as usize];
        let (pa, pb) = (self.positions[a as usize], self.positions[b as usize]);

        let (keep, remove, target) = match (la, lb) {
            (true, true) => return None,
            (true, false) => (a, b, pa),
            (false, true) => (b, a, pb),
            (false, false) => {
                let mid = nalgebra::center(&pa, &pb);
                let reach = MAX_TARGET_DRIFT * (pb - pa).norm();
                let target = q
                    .optimal_point()
                    .filter(|p| (p - mid).norm() <= reach)
                    .unwrap_or_else(|| {
                        [pa, pb, mid]
                            .into_iter()
                            .min_by(|x, y| q.evaluate(x).total_cmp(&q.evaluate(y)))
                            .unwrap_or(mid)
                    });
                (a.min(b), a.max(b), target)
            }
        };

        Some(Collapse {
            cost: q.evaluate(&target),
            keep,
            remove,
            target,
            stamps: (self.stamps[keep as usize], self.stamps[remove as usize]),
        })
    }

    fn allowed(&self, c: &Collapse) -> bool {
        if self.params.max_error.is_some_and(|max| c.cost > max) {
            return false;
        }

        let shared_faces = self
            .live_faces_of(c.remove)
            .filter(|&f| self.faces[f as usize].contains(&c.keep))
            .count();
        if shared_faces == 0 || self.live_faces < shared_faces + 4 {
            return false;
        }

        // Link condition: the edge's endpoints may only share the opposite
        // vertices of the faces on the edge.
        let keep_ring = self.neighbors(c.keep);
        let shared_vertices = self
            .neighbors(c.remove)
            .iter()
            .filter(|v| keep_ring.contains(v))
            .count();
        if shared_vertices != shared_faces {
            return false;
        }

        !self.params.prevent_flips || !self.flips_any(c)
    }

    fn flips_any(&self, c: &Collapse) -> bool {
        [c.keep, c.remove].into_iter().any(|moved| {
            self.live_faces_of(moved).any(|f| {
                let face = self.faces[f as usize];
                if face.contains(&c.keep) && face.contains(&c.remove) {
                    return false;
                }
                let before = face.map(|i| self.positions[i as usize]);
                let after = face.map(|i| {
                    if i == moved {
                        c.target
                    } else {
                        self.positions[i as usize]
                    }
                });
                let n_before = normal(&before);
                let n_after = normal(&after);
                n_after.norm_squared() <= f64::EPSILON * n_before.norm_squared()
                    || n_before.dot(&n_after) <= 0.0
            })
        })
    }

    fn apply(&mut self, c: &Collapse) {
        let (keep, remove) = (c.keep as usize, c.remove as usize);
        self.positions[keep] = c.target;
        let removed_quadric = self.quadrics[remove];
        self.quadrics[keep] += removed_quadric;
        self.stamps[keep] += 1;
        self.stamps[remove] += 1;

        let incident = std::mem::take(&mut self.vertex_faces[remove]);
        for f in incident {
            let fi = f as usize;
            if !self.face_alive[fi] || !self.faces[fi].contains(&c.remove) {
                continue;
            }
            if self.faces[fi].contains(&c.keep) {
                self.face_alive[fi] = false;
                self.live_faces -= 1;
            } else {
                for v in &mut self.faces[fi] {
                    if *v == c.remove {
                        *v = c.keep;
                    }
                }
                self.vertex_faces[keep].push(f);
            }
        }

        let (faces, alive) = (&self.faces, &self.face_alive);
        self.vertex_faces[keep]
            .retain(|f| alive[*f as usize] && faces[*f as usize].contains(&c.keep));
    }

    fn into_mesh(self) -> IndexedMesh {
        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(self.live_faces);

        for (face, _) in self
            .faces
            .iter()
            .zip(&self.face_alive)
            .filter(|&(_, &alive)| alive)
        {
            faces.push(face.map(|v| {
                let slot = &mut remap[v as usize];
                if *slot == u32::MAX {
                    *slot = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
                    vertices.push(self.positions[v as usize]);
                }
                *slot
            }));
        }
        IndexedMesh::from_parts(vertices, faces)
    }
}

const fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

fn normal(tri: &[Point3<f64>; 3]) -> Vector3<f64> {
    (tri[1] - tri[0]).cross(&(tri[2] - tri[0]))
}
