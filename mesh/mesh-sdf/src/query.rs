//! Point-triangle and ray-triangle primitives.

use mesh_types::Triangle;
use nalgebra::{Point3, Vector3};

/// Compute the closest point on a triangle to a query point.
///
/// Voronoi-region walk from "Real-Time Collision Detection" (Ericson),
/// exact for every region including edges and vertices.
///
/// # Example
///
/// ```
/// use mesh_sdf::closest_point_on_triangle;
/// use mesh_types::{Point3, Triangle};
///
/// let tri = Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
/// let p = closest_point_on_triangle(Point3::new(0.2, 0.2, 3.0), &tri);
/// assert!((p - Point3::new(0.2, 0.2, 0.0)).norm() < 1e-12);
/// ```
#[must_use]
pub fn closest_point_on_triangle(point: Point3<f64>, tri: &Triangle) -> Point3<f64> {
    let (a, b, c) = (tri.v0, tri.v1, tri.v2);
    let ab = b - a;
    let ac = c - a;
    let ap = point - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom.abs() < f64::MIN_POSITIVE {
        // Degenerate sliver; every region test above failed by rounding.
        return a;
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

/// A ray-triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit, `t > 0`.
    pub t: f64,
    /// The hit lies on an edge or vertex of the triangle.
    ///
    /// Such a hit may be shared with a neighbour or may only graze the
    /// surface, so it cannot be counted as one crossing.
    pub on_boundary: bool,
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the hit for `t > 1e-12`, or `None`. Barycentric bounds are widened
/// by a small tolerance so edge and vertex hits are reported, flagged with
/// [`RayHit::on_boundary`].
#[must_use]
pub fn ray_triangle_intersect(
    origin: Point3<f64>,
    dir: Vector3<f64>,
    tri: &Triangle,
) -> Option<RayHit> {
    const PARALLEL_EPS: f64 = 1e-14;
    const MIN_T: f64 = 1e-12;
    const BARY_EPS: f64 = 1e-9;

    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;
    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < PARALLEL_EPS {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(-BARY_EPS..=1.0 + BARY_EPS).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    let w = 1.0 - u - v;
    if v < -BARY_EPS || w < -BARY_EPS {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > MIN_T).then_some(RayHit {
        t,
        on_boundary: u.min(v).min(w) <= BARY_EPS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> Triangle {
        Triangle::from_arrays([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [5.0, 10.0, 0.0])
    }

    #[test]
    fn closest_point_face_region() {
        let closest = closest_point_on_triangle(Point3::new(5.0, 3.0, 5.0), &tri());
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(closest.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(closest.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn closest_point_vertex_region() {
        let closest = closest_point_on_triangle(Point3::new(-5.0, -5.0, 1.0), &tri());
        assert_eq!(closest, Point3::origin());
    }

    #[test]
    fn closest_point_edge_region() {
        let closest = closest_point_on_triangle(Point3::new(5.0, -5.0, 0.0), &tri());
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn closest_point_opposite_edge() {
        // Beyond the edge from (10,0,0) to (5,10,0).
        let p = Point3::new(10.0, 5.0, 0.0);
        let closest = closest_point_on_triangle(p, &tri());
        let edge = Vector3::new(-5.0, 10.0, 0.0);
        assert_relative_eq!((p - closest).dot(&edge), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn ray_hits() {
        let hit = ray_triangle_intersect(Point3::new(5.0, 3.0, 5.0), -Vector3::z(), &tri()).unwrap();
        assert_relative_eq!(hit.t, 5.0, epsilon = 1e-12);
        assert!(!hit.on_boundary);
    }

    #[test]
    fn ray_behind_origin_misses() {
        let t = ray_triangle_intersect(Point3::new(5.0, 3.0, 5.0), Vector3::z(), &tri());
        assert!(t.is_none());
    }

    #[test]
    fn ray_parallel_misses() {
        let t = ray_triangle_intersect(Point3::new(5.0, 3.0, 0.0), Vector3::x(), &tri());
        assert!(t.is_none());
    }

    #[test]
    fn ray_through_vertex_is_reported() {
        let hit = ray_triangle_intersect(Point3::new(0.0, 0.0, 1.0), -Vector3::z(), &tri()).unwrap();
        assert_relative_eq!(hit.t, 1.0, epsilon = 1e-12);
        assert!(hit.on_boundary);
    }

    #[test]
    fn ray_through_edge_is_flagged() {
        let hit = ray_triangle_intersect(Point3::new(5.0, 0.0, 2.0), -Vector3::z(), &tri()).unwrap();
        assert_relative_eq!(hit.t, 2.0, epsilon = 1e-12);
        assert!(hit.on_boundary);
    }
}
