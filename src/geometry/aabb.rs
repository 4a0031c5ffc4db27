//! Box predicates used by the octree on top of parry's [`Aabb`].

use crate::float_types::Real;
use crate::float_types::parry3d::{
    bounding_volume::Aabb,
    query::{Ray, RayCast},
};
use crate::geometry::triangle::Triangle;
use nalgebra::{Point3, Vector3};

/// Octree-specific queries on an axis-aligned box.
pub trait AabbExt {
    /// Inclusive point containment.
    fn contains_point(&self, point: &Point3<Real>) -> bool;

    /// True when all three corners of `triangle` lie inside the box.
    fn contains_triangle(&self, triangle: &Triangle) -> bool;

    /// Separating-axis overlap test between the box and a triangle.
    ///
    /// Tests the 9 edge cross products, the 3 box face normals and the
    /// triangle normal; touching counts as overlapping.
    fn intersects_triangle(&self, triangle: &Triangle) -> bool;

    /// Entry distance along `ray`, `Some(0.0)` when the origin is inside the box.
    fn ray_distance(&self, ray: &Ray) -> Option<Real>;

    /// Grow the box by `amount` on every side.
    fn padded(&self, amount: Real) -> Aabb;
}

impl AabbExt for Aabb {
    fn contains_point(&self, point: &Point3<Real>) -> bool {
        point.x >= self.mins.x
            && point.x <= self.maxs.x
            && point.y >= self.mins.y
            && point.y <= self.maxs.y
            && point.z >= self.mins.z
            && point.z <= self.maxs.z
    }

    fn contains_triangle(&self, triangle: &Triangle) -> bool {
        self.contains_point(&triangle.a)
            && self.contains_point(&triangle.b)
            && self.contains_point(&triangle.c)
    }

    fn intersects_triangle(&self, triangle: &Triangle) -> bool {
        let center = self.center();
        let extents = self.half_extents();

        // translate the triangle so the box sits at the origin
        let v0 = triangle.a - center;
        let v1 = triangle.b - center;
        let v2 = triangle.c - center;

        let f0 = v1 - v0;
        let f1 = v2 - v1;
        let f2 = v0 - v2;

        let mut axes = Vec::with_capacity(13);
        for f in [f0, f1, f2] {
            axes.push(Vector3::new(0.0, -f.z, f.y));
            axes.push(Vector3::new(f.z, 0.0, -f.x));
            axes.push(Vector3::new(-f.y, f.x, 0.0));
        }
        axes.push(Vector3::x());
        axes.push(Vector3::y());
        axes.push(Vector3::z());
        axes.push(f0.cross(&f1));

        sat_for_axes(&axes, [v0, v1, v2], &extents)
    }

    fn ray_distance(&self, ray: &Ray) -> Option<Real> {
        self.cast_local_ray(ray, Real::MAX, true)
    }

    fn padded(&self, amount: Real) -> Aabb {
        let pad = Vector3::repeat(amount);
        Aabb::new(self.mins - pad, self.maxs + pad)
    }
}

/// Smallest box holding every point, `None` for an empty iterator.
pub fn aabb_from_points<I>(points: I) -> Option<Aabb>
where
    I: IntoIterator<Item = Point3<Real>>,
{
    let mut points = points.into_iter();
    let first = points.next()?;
    let mut aabb = Aabb::new(first, first);
    for p in points {
        aabb.take_point(p);
    }
    Some(aabb)
}

fn sat_for_axes(axes: &[Vector3<Real>], vertices: [Vector3<Real>; 3], extents: &Vector3<Real>) -> bool {
    for axis in axes {
        let r = extents.x * axis.x.abs() + extents.y * axis.y.abs() + extents.z * axis.z.abs();
        let p0 = vertices[0].dot(axis);
        let p1 = vertices[1].dot(axis);
        let p2 = vertices[2].dot(axis);
        let max = p0.max(p1).max(p2);
        let min = p0.min(p1).min(p2);
        if (-max).max(min) > r {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn triangle_crossing_box_overlaps() {
        let tri = Triangle::new(
            Point3::new(-1.0, 0.5, 0.5),
            Point3::new(2.0, 0.5, 0.5),
            Point3::new(0.5, 0.5, 3.0),
        );
        assert!(unit_box().intersects_triangle(&tri));
        assert!(!unit_box().contains_triangle(&tri));
    }

    #[test]
    fn triangle_beside_box_is_separated() {
        let tri = Triangle::new(
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        );
        assert!(!unit_box().intersects_triangle(&tri));
    }

    #[test]
    fn triangle_cutting_corner_diagonally_is_separated_by_its_normal() {
        // The triangle's bounds overlap the box but the plane x+y+z=3.1 misses it.
        let tri = Triangle::new(
            Point3::new(3.1, 0.0, 0.0),
            Point3::new(0.0, 3.1, 0.0),
            Point3::new(0.0, 0.0, 3.1),
        );
        assert!(!unit_box().intersects_triangle(&tri));
    }

    #[test]
    fn face_touching_triangle_counts_as_overlap() {
        let tri = Triangle::new(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        );
        assert!(unit_box().intersects_triangle(&tri));
        assert!(unit_box().contains_triangle(&tri));
    }

    #[test]
    fn ray_distance_from_outside_and_inside() {
        let outside = Ray::new(Point3::new(-2.0, 0.5, 0.5), Vector3::x());
        assert_eq!(unit_box().ray_distance(&outside), Some(2.0));

        let inside = Ray::new(Point3::new(0.5, 0.5, 0.5), Vector3::x());
        assert_eq!(unit_box().ray_distance(&inside), Some(0.0));

        let away = Ray::new(Point3::new(-2.0, 0.5, 0.5), -Vector3::x());
        assert_eq!(unit_box().ray_distance(&away), None);
    }
}
