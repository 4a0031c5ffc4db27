//! Three-point triangle with a cached centroid.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use nalgebra::{Point3, Vector3};
use std::sync::OnceLock;

/// Triangle stored as three points.
///
/// The centroid is computed on first use and cached until the points change
/// through [`Triangle::set`], the only way to move them.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub(crate) a: Point3<Real>,
    pub(crate) b: Point3<Real>,
    pub(crate) c: Point3<Real>,
    midpoint: OnceLock<Point3<Real>>,
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b && self.c == other.c
    }
}

impl Triangle {
    pub const fn new(a: Point3<Real>, b: Point3<Real>, c: Point3<Real>) -> Self {
        Triangle {
            a,
            b,
            c,
            midpoint: OnceLock::new(),
        }
    }

    /// Replace all three points and drop the cached centroid.
    pub fn set(&mut self, a: Point3<Real>, b: Point3<Real>, c: Point3<Real>) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.midpoint = OnceLock::new();
    }

    pub const fn points(&self) -> [Point3<Real>; 3] {
        [self.a, self.b, self.c]
    }

    /// Centroid `(a + b + c) / 3`.
    pub fn midpoint(&self) -> Point3<Real> {
        *self
            .midpoint
            .get_or_init(|| Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0))
    }

    /// Unnormalized face normal `(b - a) × (c - a)`.
    pub fn scaled_normal(&self) -> Vector3<Real> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn area(&self) -> Real {
        self.scaled_normal().norm() * 0.5
    }

    /// Tight axis-aligned bounds.
    pub fn aabb(&self) -> Aabb {
        let mins = self.a.inf(&self.b).inf(&self.c);
        let maxs = self.a.sup(&self.b).sup(&self.c);
        Aabb::new(mins, maxs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_is_recomputed_after_set() {
        let mut tri = Triangle::new(
            Point3::origin(),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        );
        assert_eq!(tri.midpoint(), Point3::new(1.0, 1.0, 0.0));

        tri.set(
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(3.0, 0.0, 3.0),
            Point3::new(0.0, 3.0, 3.0),
        );
        assert_eq!(tri.midpoint(), Point3::new(1.0, 1.0, 3.0));
        assert_eq!(tri.points()[0], Point3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn area_of_right_triangle() {
        let tri = Triangle::new(
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        assert_eq!(tri.area(), 2.0);
        assert_eq!(tri.scaled_normal(), Vector3::new(0.0, 0.0, 4.0));
    }
}
