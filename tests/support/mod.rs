//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use octree_csg::{
    Octree,
    float_types::Real,
    mesh::{polygon::Polygon, vertex::Vertex},
};

/// Returns the bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// of every valid polygon in `octree`.
pub fn bounding_box(octree: &Octree) -> [Real; 6] {
    let mut bb = [
        Real::MAX,
        Real::MAX,
        Real::MAX,
        Real::MIN,
        Real::MIN,
        Real::MIN,
    ];
    for polygon in octree.polygons() {
        for v in polygon.vertices() {
            for axis in 0..3 {
                bb[axis] = bb[axis].min(v.pos[axis]);
                bb[axis + 3] = bb[axis + 3].max(v.pos[axis]);
            }
        }
    }
    bb
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Enclosed volume by the divergence theorem; only meaningful for closed,
/// outward-wound surfaces.
pub fn volume(octree: &Octree) -> Real {
    octree
        .triangles()
        .iter()
        .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
        .sum()
}

/// Total area of every valid polygon.
pub fn surface_area(octree: &Octree) -> Real {
    octree.polygons().iter().map(|p| p.triangle().area()).sum()
}

/// Triangle from three corners; every vertex gets the face normal.
pub fn make_triangle(points: [[Real; 3]; 3]) -> Polygon {
    let [a, b, c] = points.map(|p| Point3::new(p[0], p[1], p[2]));
    Polygon::from_points(a, b, c, 0)
}

/// Triangle with an explicit (possibly unrelated) vertex normal.
pub fn make_triangle_with_normal(points: [[Real; 3]; 3], normal: Vector3<Real>) -> Polygon {
    let vertices = points.map(|p| Vertex::new(Point3::new(p[0], p[1], p[2]), normal));
    Polygon::new(vertices, 0)
}

/// Translated copy of a built octree.
pub fn translated(mut octree: Octree, x: Real, y: Real, z: Real) -> Octree {
    octree
        .apply_matrix(&nalgebra::Matrix4::new_translation(&Vector3::new(x, y, z)))
        .expect("translation is invertible");
    octree
}
