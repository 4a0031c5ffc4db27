//! Oriented planes and the polygon splitter built on them.

use crate::float_types::{EPSILON, Real};
use crate::mesh::polygon::{Polygon, PolygonState};
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};

// Vertex classification flags, OR-combined per polygon
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane `normal · p = w` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

/// Where a polygon, or a fragment of it, lies relative to a splitting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    Front,
    Back,
    /// In the plane, facing the same way.
    CoplanarFront,
    /// In the plane, facing the opposite way.
    CoplanarBack,
    /// The split produced nothing usable; the polygon is returned as-is.
    Undecided,
}

impl SplitKind {
    /// The classification state a coplanar result stamps onto the polygon.
    pub const fn coplanar_state(self) -> Option<PolygonState> {
        match self {
            SplitKind::CoplanarFront => Some(PolygonState::CoplanarFront),
            SplitKind::CoplanarBack => Some(PolygonState::CoplanarBack),
            _ => None,
        }
    }
}

/// Result of [`Plane::split_polygon`].
#[derive(Debug, Clone)]
pub enum PolygonSplit {
    /// The polygon lies on one side of (or in) the plane and is untouched.
    Whole(SplitKind),
    /// The polygon spans the plane and was cut into new triangles.
    Fragments(Vec<(Polygon, SplitKind)>),
}

impl Plane {
    /// Plane from a (not necessarily unit) normal and offset.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let len = normal.norm();
        if len < Real::EPSILON {
            return Plane { normal: Vector3::z(), w };
        }
        Plane {
            normal: normal / len,
            w: w / len,
        }
    }

    /// Plane through three points, oriented by the right-hand rule on `(b - a) × (c - a)`.
    ///
    /// Degenerate (collinear) input yields the `z = 0` plane.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Self {
        let n = (b - a).cross(&(c - a));
        match n.try_normalize(Real::EPSILON * Real::EPSILON) {
            Some(normal) => Plane {
                normal,
                w: normal.dot(&a.coords),
            },
            None => Plane {
                normal: Vector3::z(),
                w: 0.0,
            },
        }
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Signed distance of `point` from the plane.
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point as [`FRONT`], [`BACK`] or [`COPLANAR`] with tolerance [`EPSILON`].
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let t = self.signed_distance(point);
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Split a triangle by this plane.
    ///
    /// Polygons entirely on one side, or in the plane, come back as
    /// [`PolygonSplit::Whole`] with their classification; coplanar polygons are
    /// [`SplitKind::CoplanarFront`] when their normal agrees with the plane's.
    ///
    /// Spanning polygons are cut along the plane. Each side's vertex loop is
    /// re-triangulated: 3 vertices make one triangle, 4 are split along the
    /// shorter diagonal, more fall back to a fan with a warning. Fragments are
    /// fresh polygons with new ids and the source's material.
    pub fn split_polygon(&self, polygon: &Polygon) -> PolygonSplit {
        let vertices = polygon.vertices();
        let types: [i8; 3] = std::array::from_fn(|i| self.orient_point(&vertices[i].pos));
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane().normal) > 0.0 {
                    PolygonSplit::Whole(SplitKind::CoplanarFront)
                } else {
                    PolygonSplit::Whole(SplitKind::CoplanarBack)
                }
            },
            FRONT => PolygonSplit::Whole(SplitKind::Front),
            BACK => PolygonSplit::Whole(SplitKind::Back),
            _ => {
                let mut front = Vec::<Vertex>::with_capacity(4);
                let mut back = Vec::<Vertex>::with_capacity(4);

                for i in 0..3 {
                    let j = (i + 1) % 3;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&vertices[i], &vertices[j]);

                    if ti != BACK {
                        front.push(vi.clone());
                    }
                    if ti != FRONT {
                        back.push(vi.clone());
                    }
                    if (ti | tj) == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.pos.coords))
                            / self.normal.dot(&(vj.pos - vi.pos));
                        let v = vi.interpolate(vj, t);
                        front.push(v.clone());
                        back.push(v);
                    }
                }

                let material = polygon.material;
                let mut fragments = Vec::with_capacity(4);
                for (loop_vertices, kind) in [(front, SplitKind::Front), (back, SplitKind::Back)] {
                    for tri in triangulate_loop(loop_vertices) {
                        fragments.push((Polygon::new(tri, material), kind));
                    }
                }

                if fragments.is_empty() {
                    PolygonSplit::Whole(SplitKind::Undecided)
                } else {
                    PolygonSplit::Fragments(fragments)
                }
            },
        }
    }
}

/// Turn a convex vertex loop into triangles.
fn triangulate_loop(vertices: Vec<Vertex>) -> Vec<[Vertex; 3]> {
    match vertices.len() {
        0..=2 => Vec::new(),
        3 => <[Vertex; 3]>::try_from(vertices).map(|tri| vec![tri]).unwrap_or_default(),
        4 => {
            let v = &vertices;
            if (v[0].pos - v[2].pos).norm() <= (v[1].pos - v[3].pos).norm() {
                vec![
                    [v[0].clone(), v[1].clone(), v[2].clone()],
                    [v[0].clone(), v[2].clone(), v[3].clone()],
                ]
            } else {
                vec![
                    [v[0].clone(), v[1].clone(), v[3].clone()],
                    [v[1].clone(), v[2].clone(), v[3].clone()],
                ]
            }
        },
        n => {
            log::warn!("splitting produced a {n}-vertex fragment, fan-triangulating it");
            (1..n - 1)
                .map(|i| [vertices[0].clone(), vertices[i].clone(), vertices[i + 1].clone()])
                .collect()
        },
    }
}
