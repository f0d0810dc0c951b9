//! Triangle type for geometric calculations.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle with concrete vertex positions.
///
/// Stores the positions rather than indices, so it can be handed to
/// distance queries and samplers without the owning mesh.
///
/// Winding is **counter-clockwise (CCW) when viewed from the front**
/// (normal points toward viewer).
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
///
/// assert!((tri.area() - 0.5).abs() < 1e-10);
///
/// let normal = tri.normal().unwrap();
/// assert!((normal.z - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Create a triangle from coordinate arrays.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Triangle;
    ///
    /// let tri = Triangle::from_arrays(
    ///     [0.0, 0.0, 0.0],
    ///     [1.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0],
    /// );
    /// assert!((tri.max_edge_length() - 2.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_arrays(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> Self {
        Self {
            v0: Point3::from(v0),
            v1: Point3::from(v1),
            v2: Point3::from(v2),
        }
    }

    /// Compute the (unnormalized) face normal via cross product.
    ///
    /// The magnitude equals twice the triangle's area.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Compute the unit face normal.
    ///
    /// Returns `None` for degenerate triangles (zero area).
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.normal_unnormalized().try_normalize(f64::EPSILON)
    }

    /// Compute the triangle area.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Compute the centroid (average of the three vertices).
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Evaluate the point at barycentric weights `(1 - u - v, u, v)`.
    ///
    /// Used by the area-weighted surface sampler, which draws `u` and `v`
    /// uniformly and folds them back into the triangle.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let tri = Triangle::from_arrays([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
    /// let p = tri.point_at(0.5, 0.25);
    /// assert_eq!(p, Point3::new(1.0, 0.5, 0.0));
    /// ```
    #[inline]
    #[must_use]
    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        self.v0 + (self.v1 - self.v0) * u + (self.v2 - self.v0) * v
    }

    /// Edge lengths `[|v0v1|, |v1v2|, |v2v0|]`.
    #[must_use]
    pub fn edge_lengths(&self) -> [f64; 3] {
        [
            (self.v1 - self.v0).norm(),
            (self.v2 - self.v1).norm(),
            (self.v0 - self.v2).norm(),
        ]
    }

    /// Length of the longest edge.
    #[must_use]
    pub fn max_edge_length(&self) -> f64 {
        let [a, b, c] = self.edge_lengths();
        a.max(b).max(c)
    }

    /// Get vertices as an array.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn right_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        )
    }

    #[test]
    fn area_and_edges() {
        let tri = right_triangle();
        assert_relative_eq!(tri.area(), 6.0);
        let lengths = tri.edge_lengths();
        assert_relative_eq!(lengths[0], 3.0);
        assert_relative_eq!(lengths[1], 5.0);
        assert_relative_eq!(lengths[2], 4.0);
        assert_relative_eq!(tri.max_edge_length(), 5.0);
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let c = right_triangle().centroid();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 4.0 / 3.0);
    }

    #[test]
    fn degenerate_has_no_normal() {
        let tri = Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        assert!(tri.normal().is_none());
        assert_relative_eq!(tri.area(), 0.0);
    }

    #[test]
    fn point_at_corners() {
        let tri = right_triangle();
        assert_eq!(tri.point_at(0.0, 0.0), tri.v0);
        assert_eq!(tri.point_at(1.0, 0.0), tri.v1);
        assert_eq!(tri.point_at(0.0, 1.0), tri.v2);
    }
}
