//! Primitive solids as built octrees.
//!
//! Every face is wound counter-clockwise seen from outside, so plane normals
//! point out of the solid.

use crate::config::OctreeSettings;
use crate::float_types::{PI, Real, TAU};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::octree::Octree;
use nalgebra::{Point3, Vector3};

impl Octree {
    /// Axis-aligned box spanning `[0, width] × [0, length] × [0, height]`.
    ///
    /// ```text
    ///     4-------5
    ///    /|      /|
    ///   0-------1 |
    ///   | |     | |
    ///   | 7-----|-6
    ///   |/      |/
    ///   3-------2
    /// ```
    pub fn cuboid(width: Real, length: Real, height: Real) -> Octree {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(width, 0.0, 0.0),
            Point3::new(width, length, 0.0),
            Point3::new(0.0, length, 0.0),
            Point3::new(0.0, 0.0, height),
            Point3::new(width, 0.0, height),
            Point3::new(width, length, height),
            Point3::new(0.0, length, height),
        ];
        let faces: [([usize; 4], Vector3<Real>); 6] = [
            ([0, 3, 2, 1], -Vector3::z()),
            ([4, 5, 6, 7], Vector3::z()),
            ([0, 1, 5, 4], -Vector3::y()),
            ([3, 7, 6, 2], Vector3::y()),
            ([0, 4, 7, 3], -Vector3::x()),
            ([1, 2, 6, 5], Vector3::x()),
        ];

        let polygons = faces.into_iter().flat_map(|(quad, normal)| {
            let vertex = |i: usize| Vertex::new(corners[quad[i]], normal);
            [
                Polygon::new([vertex(0), vertex(1), vertex(2)], 0),
                Polygon::new([vertex(0), vertex(2), vertex(3)], 0),
            ]
        });
        Octree::from_polygons(polygons, OctreeSettings::default())
    }

    pub fn cube(size: Real) -> Octree {
        Self::cuboid(size, size, size)
    }

    /// UV sphere centered on the origin with its poles on the y axis.
    ///
    /// `segments` slices around the axis, `stacks` bands from pole to pole.
    /// The degenerate half of every pole quad is skipped.
    pub fn sphere(radius: Real, segments: usize, stacks: usize) -> Octree {
        let segments = segments.max(3);
        let stacks = stacks.max(2);
        let point = |i: usize, j: usize| {
            let theta = i as Real / segments as Real * TAU;
            let phi = j as Real / stacks as Real * PI;
            let dir = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            Vertex::new(Point3::from(dir * radius), dir)
        };

        let mut polygons = Vec::with_capacity(2 * segments * stacks);
        for i in 0..segments {
            for j in 0..stacks {
                let quad = [point(i, j), point(i + 1, j), point(i + 1, j + 1), point(i, j + 1)];
                if j > 0 {
                    polygons.push(Polygon::new(
                        [quad[0].clone(), quad[1].clone(), quad[2].clone()],
                        0,
                    ));
                }
                if j < stacks - 1 {
                    let [q0, _, q2, q3] = quad;
                    polygons.push(Polygon::new([q0, q2, q3], 0));
                }
            }
        }
        Octree::from_polygons(polygons, OctreeSettings::default())
    }

    /// Cylinder along z from `0` to `height`.
    pub fn cylinder(radius: Real, height: Real, segments: usize) -> Octree {
        let segments = segments.max(3);
        let ring = |i: usize, z: Real| {
            let angle = i as Real / segments as Real * TAU;
            Point3::new(angle.cos() * radius, angle.sin() * radius, z)
        };
        let bottom_center = Point3::new(0.0, 0.0, 0.0);
        let top_center = Point3::new(0.0, 0.0, height);

        let mut polygons = Vec::with_capacity(4 * segments);
        for i in 0..segments {
            let next = (i + 1) % segments;
            let (b0, b1) = (ring(i, 0.0), ring(next, 0.0));
            let (t0, t1) = (ring(i, height), ring(next, height));

            polygons.push(Polygon::from_points(bottom_center, b1, b0, 0));
            polygons.push(Polygon::from_points(top_center, t0, t1, 0));

            let side = |p: Point3<Real>| {
                let n = Vector3::new(p.x, p.y, 0.0);
                Vertex::new(p, n.try_normalize(0.0).unwrap_or_else(Vector3::zeros))
            };
            polygons.push(Polygon::new([side(b0), side(b1), side(t1)], 0));
            polygons.push(Polygon::new([side(b0), side(t1), side(t0)], 0));
        }
        Octree::from_polygons(polygons, OctreeSettings::default())
    }
}
