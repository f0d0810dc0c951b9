//! Bounding Volume Hierarchy over mesh triangles.
//!
//! Two queries are supported: ray candidate collection for crossing counts,
//! and branch-and-bound nearest-triangle search for closest-point queries.
//! Both run in roughly O(log n) per query instead of O(n).

use mesh_types::{Aabb, Point3, Triangle, Vector3};
use smallvec::SmallVec;

/// Triangles per leaf used by [`SignedDistanceField`](crate::SignedDistanceField).
pub const DEFAULT_MAX_LEAF_SIZE: usize = 8;

/// Subtrees at least this large are built on separate rayon tasks.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// BVH node containing either leaf triangles or child nodes.
#[derive(Debug)]
enum BvhNode {
    Leaf {
        bbox: Aabb,
        triangles: SmallVec<[u32; 8]>,
    },
    Internal {
        bbox: Aabb,
        left: Box<Self>,
        right: Box<Self>,
    },
}

impl BvhNode {
    fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Bounding Volume Hierarchy for a triangle list.
///
/// Triangle ids returned by queries are positions in the slice passed to
/// [`Bvh::build`].
///
/// # Example
///
/// ```
/// use mesh_sdf::Bvh;
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// let triangles: Vec<_> = cube.triangles().collect();
/// let bvh = Bvh::build(&triangles, 2, usize::MAX);
/// assert_eq!(bvh.triangle_count(), 12);
/// assert!(bvh.stats().leaf_count >= 6);
/// ```
#[derive(Debug)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangle_count: usize,
}

impl Bvh {
    /// Build a BVH by median split along the longest axis of each node.
    ///
    /// Subtrees with at least `parallel_threshold` triangles build their two
    /// halves with `rayon::join`. The resulting tree does not depend on the
    /// threshold.
    #[must_use]
    pub fn build(triangles: &[Triangle], max_leaf_size: usize, parallel_threshold: usize) -> Self {
        if triangles.is_empty() {
            return Self {
                root: None,
                triangle_count: 0,
            };
        }

        let boxes: Vec<(u32, Aabb, Point3<f64>)> = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let bbox = Aabb::from_triangle(&t.v0, &t.v1, &t.v2);
                #[allow(clippy::cast_possible_truncation)]
                // Face ids are u32 throughout the mesh types
                (i as u32, bbox, bbox.center())
            })
            .collect();

        let mut order: Vec<usize> = (0..boxes.len()).collect();
        let root = build_node(
            &boxes,
            &mut order,
            max_leaf_size.max(1),
            parallel_threshold.max(2),
        );

        Self {
            root: Some(root),
            triangle_count: triangles.len(),
        }
    }

    /// Number of triangles indexed by the tree.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Check if the BVH is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounding box of the whole tree.
    #[must_use]
    pub fn bounds(&self) -> Option<&Aabb> {
        self.root.as_ref().map(BvhNode::bbox)
    }

    /// Collect the ids of triangles whose boxes the ray `origin + t·dir`
    /// (`t >= 0`) passes through.
    ///
    /// `out` is cleared first so one buffer can be reused across queries.
    pub fn ray_candidates(&self, origin: &Point3<f64>, dir: &Vector3<f64>, out: &mut Vec<u32>) {
        out.clear();
        let Some(root) = &self.root else {
            return;
        };
        let inv_dir = dir.map(|d| 1.0 / d);
        let mut stack: SmallVec<[&BvhNode; 64]> = SmallVec::new();
        stack.push(root);
        while let Some(node) = stack.pop() {
            if !ray_hits_box(node.bbox(), origin, &inv_dir) {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => out.extend(triangles.iter().copied()),
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Find the triangle minimizing `distance_squared(id)` for a point.
    ///
    /// `distance_squared` must return the exact squared distance from
    /// `point` to triangle `id`. Boxes whose lower bound already exceeds
    /// the best candidate are skipped. Returns `(id, squared distance)`.
    pub fn nearest<F>(&self, point: &Point3<f64>, distance_squared: F) -> Option<(u32, f64)>
    where
        F: Fn(u32) -> f64,
    {
        let root = self.root.as_ref()?;
        let mut best: Option<(u32, f64)> = None;
        let mut stack: SmallVec<[(&BvhNode, f64); 64]> = SmallVec::new();
        stack.push((root, root.bbox().distance_squared(point)));

        while let Some((node, lower_bound)) = stack.pop() {
            if best.is_some_and(|(_, d)| lower_bound >= d) {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    for &id in triangles {
                        let d = distance_squared(id);
                        if best.is_none_or(|(best_id, best_d)| d < best_d || (d == best_d && id < best_id)) {
                            best = Some((id, d));
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let dl = left.bbox().distance_squared(point);
                    let dr = right.bbox().distance_squared(point);
                    // Pop the nearer child first.
                    if dl <= dr {
                        stack.push((right, dr));
                        stack.push((left, dl));
                    } else {
                        stack.push((left, dl));
                        stack.push((right, dr));
                    }
                }
            }
        }
        best
    }

    /// Get statistics about the tree shape.
    #[must_use]
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        if let Some(root) = &self.root {
            collect_stats(root, 0, &mut stats);
        }
        stats
    }
}

fn build_node(
    boxes: &[(u32, Aabb, Point3<f64>)],
    order: &mut [usize],
    max_leaf_size: usize,
    parallel_threshold: usize,
) -> BvhNode {
    let bbox = order
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.merge(&boxes[i].1));

    if order.len() <= max_leaf_size {
        return BvhNode::Leaf {
            bbox,
            triangles: order.iter().map(|&i| boxes[i].0).collect(),
        };
    }

    let centroid_bounds = Aabb::from_points(order.iter().map(|&i| &boxes[i].2));
    let axis = centroid_bounds.longest_axis();
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        boxes[a].2[axis]
            .total_cmp(&boxes[b].2[axis])
            .then(a.cmp(&b))
    });

    let (left_order, right_order) = order.split_at_mut(mid);
    let (left, right) = if left_order.len() + right_order.len() >= parallel_threshold {
        rayon::join(
            || build_node(boxes, left_order, max_leaf_size, parallel_threshold),
            || build_node(boxes, right_order, max_leaf_size, parallel_threshold),
        )
    } else {
        (
            build_node(boxes, left_order, max_leaf_size, parallel_threshold),
            build_node(boxes, right_order, max_leaf_size, parallel_threshold),
        )
    };

    BvhNode::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Slab test for a ray with `t >= 0`. Boundaries count as hits.
fn ray_hits_box(bbox: &Aabb, origin: &Point3<f64>, inv_dir: &Vector3<f64>) -> bool {
    let mut t_min = 0.0_f64;
    let mut t_max = f64::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let inv = inv_dir[axis];
        if inv.is_infinite() {
            // Ray parallel to this slab.
            if o < bbox.min[axis] || o > bbox.max[axis] {
                return false;
            }
            continue;
        }
        let t1 = (bbox.min[axis] - o) * inv;
        let t2 = (bbox.max[axis] - o) * inv;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return false;
        }
    }
    true
}

fn collect_stats(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
    stats.max_depth = stats.max_depth.max(depth);
    match node {
        BvhNode::Leaf { triangles, .. } => {
            stats.leaf_count += 1;
            stats.max_leaf_size = stats.max_leaf_size.max(triangles.len());
        }
        BvhNode::Internal { left, right, .. } => {
            stats.internal_count += 1;
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}

/// Statistics about BVH structure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BvhStats {
    /// Number of internal (branch) nodes.
    pub internal_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Maximum depth of the tree.
    pub max_depth: usize,
    /// Maximum number of triangles in any leaf.
    pub max_leaf_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::closest_point_on_triangle;
    use mesh_types::{axis_aligned_box, IndexedMesh, MeshTopology};

    /// A row of `n` small boxes along +X.
    fn box_row(n: usize) -> Vec<Triangle> {
        let mut mesh = IndexedMesh::new();
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f64 * 2.0;
            mesh.merge(&axis_aligned_box(
                Point3::new(x, 0.0, 0.0),
                Point3::new(x + 1.0, 1.0, 1.0),
            ));
        }
        mesh.triangles().collect()
    }

    fn brute_nearest(triangles: &[Triangle], p: &Point3<f64>) -> f64 {
        triangles
            .iter()
            .map(|t| (closest_point_on_triangle(*p, t) - p).norm_squared())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn empty_build() {
        let bvh = Bvh::build(&[], 8, 16);
        assert!(bvh.is_empty());
        assert!(bvh.bounds().is_none());
        assert!(bvh.nearest(&Point3::origin(), |_| 0.0).is_none());
    }

    #[test]
    fn leaves_respect_max_size() {
        let tris = box_row(20);
        let bvh = Bvh::build(&tris, 4, usize::MAX);
        let stats = bvh.stats();
        assert!(stats.max_leaf_size <= 4);
        assert_eq!(stats.leaf_count, stats.internal_count + 1);
    }

    #[test]
    fn parallel_and_serial_build_agree() {
        let tris = box_row(40);
        let serial = Bvh::build(&tris, 4, usize::MAX);
        let parallel = Bvh::build(&tris, 4, 8);
        assert_eq!(serial.stats(), parallel.stats());

        let p = Point3::new(13.3, 2.0, -0.5);
        let dist = |id: u32| (closest_point_on_triangle(p, &tris[id as usize]) - p).norm_squared();
        assert_eq!(serial.nearest(&p, dist), parallel.nearest(&p, dist));
    }

    #[test]
    fn nearest_matches_brute_force() {
        let tris = box_row(25);
        let bvh = Bvh::build(&tris, 4, usize::MAX);
        for p in [
            Point3::new(-3.0, 0.5, 0.5),
            Point3::new(7.5, 0.5, 0.5),
            Point3::new(20.2, -4.0, 9.0),
            Point3::new(48.9, 0.2, 0.9),
        ] {
            let dist = |id: u32| (closest_point_on_triangle(p, &tris[id as usize]) - p).norm_squared();
            let (_, d) = bvh.nearest(&p, dist).unwrap();
            assert!((d - brute_nearest(&tris, &p)).abs() < 1e-12);
        }
    }

    #[test]
    fn ray_candidates_cover_every_hit() {
        let tris = box_row(10);
        let bvh = Bvh::build(&tris, 2, usize::MAX);
        let mut out = Vec::new();
        let origin = Point3::new(-1.0, 0.3, 0.6);
        bvh.ray_candidates(&origin, &Vector3::x(), &mut out);

        let hits: Vec<u32> = (0..tris.len())
            .filter(|&i| crate::query::ray_triangle_intersect(origin, Vector3::x(), &tris[i]).is_some())
            .map(|i| u32::try_from(i).unwrap())
            .collect();
        assert_eq!(hits.len(), 20);
        for id in hits {
            assert!(out.contains(&id));
        }

        // A ray pointing away from every box.
        bvh.ray_candidates(&origin, &-Vector3::x(), &mut out);
        assert!(out.is_empty());
    }
}
