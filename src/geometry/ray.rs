//! Ray/triangle intersection.

use crate::float_types::{RAY_EPSILON, Real};
use crate::geometry::triangle::Triangle;

pub use crate::float_types::parry3d::query::Ray;

/// Möller–Trumbore ray/triangle test, returning the ray parameter of the hit.
///
/// Both faces are hit (no back-face culling). Edges are widened by
/// `RAY_EPSILON` in barycentric terms so a ray through a shared edge hits
/// both neighbours. Hits at `t <= RAY_EPSILON`, i.e. on or behind the origin,
/// are rejected, as are rays parallel to the triangle's plane.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> Option<Real> {
    let edge1 = triangle.b - triangle.a;
    let edge2 = triangle.c - triangle.a;
    let h = ray.dir.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < RAY_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - triangle.a;
    let u = inv_det * s.dot(&h);
    if !(-RAY_EPSILON..=1.0 + RAY_EPSILON).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv_det * ray.dir.dot(&q);
    if v < -RAY_EPSILON || u + v > 1.0 + RAY_EPSILON {
        return None;
    }

    let t = inv_det * edge2.dot(&q);
    (t > RAY_EPSILON).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn floor() -> Triangle {
        Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn hits_from_either_side() {
        let down = Ray::new(Point3::new(0.0, 0.0, 2.0), -Vector3::z());
        assert_eq!(intersect_triangle(&down, &floor()), Some(2.0));

        let up = Ray::new(Point3::new(0.0, 0.0, -3.0), Vector3::z());
        assert_eq!(intersect_triangle(&up, &floor()), Some(3.0));
    }

    #[test]
    fn misses_behind_origin_and_outside_edges() {
        let away = Ray::new(Point3::new(0.0, 0.0, 2.0), Vector3::z());
        assert_eq!(intersect_triangle(&away, &floor()), None);

        let beside = Ray::new(Point3::new(5.0, 0.0, 2.0), -Vector3::z());
        assert_eq!(intersect_triangle(&beside, &floor()), None);

        let parallel = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::x());
        assert_eq!(intersect_triangle(&parallel, &floor()), None);
    }

    #[test]
    fn shared_diagonal_hits_both_halves() {
        let lower = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
        );
        let upper = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        );
        let ray = Ray::new(Point3::new(2.0 / 3.0 + 1.0, 2.0 / 3.0 + 1.0, 1.0), -Vector3::z());
        assert!(intersect_triangle(&ray, &lower).is_some());
        assert!(intersect_triangle(&ray, &upper).is_some());
    }

    #[test]
    fn origin_on_the_surface_is_not_a_hit() {
        let on = Ray::new(Point3::new(0.0, 0.0, 0.0), -Vector3::z());
        assert_eq!(intersect_triangle(&on, &floor()), None);
    }
}
