//! Quadric error metric.
//!
//! A quadric accumulates squared distances to a set of planes. Summing the
//! quadrics of two vertices gives the error of placing their merged vertex
//! anywhere in space.

use std::ops::{Add, AddAssign};

use mesh_types::{Point3, Vector3};
use nalgebra::{Matrix3, Matrix4, Vector4};

/// Determinant below which the 3x3 block is treated as singular.
const SINGULAR_DET: f64 = 1e-10;

/// Symmetric 4x4 quadric `Q` with error `vᵀQv` for `v = [x, y, z, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadric(Matrix4<f64>);

impl Default for Quadric {
    fn default() -> Self {
        Self(Matrix4::zeros())
    }
}

impl Quadric {
    /// Quadric of the plane `n·x + d = 0`; `normal` must be unit length.
    #[must_use]
    pub fn from_plane(normal: &Vector3<f64>, d: f64) -> Self {
        let p = Vector4::new(normal.x, normal.y, normal.z, d);
        Self(p * p.transpose())
    }

    /// Quadric of the plane through `point` with unit `normal`.
    #[must_use]
    pub fn from_point_normal(point: &Point3<f64>, normal: &Vector3<f64>) -> Self {
        Self::from_plane(normal, -normal.dot(&point.coords))
    }

    /// Sum of squared plane distances at `point`.
    #[must_use]
    pub fn evaluate(&self, point: &Point3<f64>) -> f64 {
        let v = point.to_homogeneous();
        (v.transpose() * self.0 * v)[(0, 0)].max(0.0)
    }

    /// Point minimizing the error, or `None` when the planes do not pin one down.
    #[must_use]
    pub fn optimal_point(&self) -> Option<Point3<f64>> {
        let a: Matrix3<f64> = self.0.fixed_view::<3, 3>(0, 0).into_owned();
        if a.determinant().abs() < SINGULAR_DET {
            return None;
        }
        let b: Vector3<f64> = -self.0.fixed_view::<3, 1>(0, 3).into_owned();
        a.try_inverse().map(|inv| Point3::from(inv * b))
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Add for Quadric {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}
