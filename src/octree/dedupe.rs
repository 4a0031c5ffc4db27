//! Exact duplicate-triangle filter used when harvesting boolean results.

use crate::float_types::{EPSILON, Real};
use crate::geometry::triangle::Triangle;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Set of triangles compared by exact, order-sensitive vertex equality.
///
/// Triangles are bucketed by their quantized centroid so lookups only
/// compare against the few triangles sharing a cell.
#[derive(Debug, Default, Clone)]
pub struct TriangleSet {
    cells: HashMap<[i64; 3], Vec<[Point3<Real>; 3]>>,
    len: usize,
}

impl TriangleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `triangle`; returns `false` if an identical one is already present.
    pub fn insert(&mut self, triangle: &Triangle) -> bool {
        let points = triangle.points();
        let bucket = self.cells.entry(cell_key(&triangle.midpoint())).or_default();
        if bucket.contains(&points) {
            return false;
        }
        bucket.push(points);
        self.len += 1;
        true
    }

    pub fn contains(&self, triangle: &Triangle) -> bool {
        let points = triangle.points();
        self.cells
            .get(&cell_key(&triangle.midpoint()))
            .is_some_and(|bucket| bucket.contains(&points))
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn cell_key(p: &Point3<Real>) -> [i64; 3] {
    [
        (p.x / EPSILON).floor() as i64,
        (p.y / EPSILON).floor() as i64,
        (p.z / EPSILON).floor() as i64,
    ]
}
