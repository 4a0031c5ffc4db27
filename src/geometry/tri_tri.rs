//! Exact triangle/triangle intersection.
//!
//! The 3D test follows Guigue and Devillers, *Fast and Robust Triangle-Triangle
//! Overlap Test Using Orientation Predicates*: both triangles are rejected
//! early when one lies strictly on one side of the other's plane, vertices are
//! then permuted into a canonical order by the signs of their plane distances,
//! and the intersection segment is constructed from the two crossing edges.
//!
//! Triangles that lie in the same plane are projected onto the axis plane
//! where they keep the most area and tested with 2D orientation predicates.
//! [`triangles_intersect`] additionally reports coplanar triangles whose
//! edges cross.

use crate::float_types::{EPSILON, Real};
use crate::geometry::triangle::Triangle;
use nalgebra::{Point2, Point3, Vector3};

/// Outcome of [`triangle_intersection`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriTriIntersection {
    /// The triangles share at least one point.
    pub intersects: bool,
    /// Every vertex of each triangle lies exactly on the other's plane.
    pub coplanar: bool,
    /// Endpoints of the intersection segment for non-coplanar hits.
    pub segment: Option<(Point3<Real>, Point3<Real>)>,
}

/// Whether two triangles intersect, including coplanar triangles whose edges
/// properly cross.
pub fn triangles_intersect(t1: &Triangle, t2: &Triangle) -> bool {
    let result = triangle_intersection(t1, t2);
    result.intersects || (result.coplanar && coplanar_edges_cross(t1, t2))
}

/// Full Guigue–Devillers test.
pub fn triangle_intersection(t1: &Triangle, t2: &Triangle) -> TriTriIntersection {
    let (p1, q1, r1) = (t1.a, t1.b, t1.c);
    let (p2, q2, r2) = (t2.a, t2.b, t2.c);

    // signed distances of t1 to the plane of t2
    let n2 = (p2 - r2).cross(&(q2 - r2));
    let dp1 = (p1 - r2).dot(&n2);
    let dq1 = (q1 - r2).dot(&n2);
    let dr1 = (r1 - r2).dot(&n2);
    if dp1 * dq1 > 0.0 && dp1 * dr1 > 0.0 {
        return TriTriIntersection::default();
    }

    // signed distances of t2 to the plane of t1
    let n1 = (q1 - p1).cross(&(r1 - p1));
    let dp2 = (p2 - r1).dot(&n1);
    let dq2 = (q2 - r1).dot(&n1);
    let dr2 = (r2 - r1).dot(&n1);
    if dp2 * dq2 > 0.0 && dp2 * dr2 > 0.0 {
        return TriTriIntersection::default();
    }

    let planes = Planes { n1, n2 };
    let d2 = [dp2, dq2, dr2];
    let swap = [dp2, dr2, dq2];

    if dp1 > 0.0 {
        if dq1 > 0.0 {
            planes.tri_tri_3d([r1, p1, q1], [p2, r2, q2], swap)
        } else if dr1 > 0.0 {
            planes.tri_tri_3d([q1, r1, p1], [p2, r2, q2], swap)
        } else {
            planes.tri_tri_3d([p1, q1, r1], [p2, q2, r2], d2)
        }
    } else if dp1 < 0.0 {
        if dq1 < 0.0 {
            planes.tri_tri_3d([r1, p1, q1], [p2, q2, r2], d2)
        } else if dr1 < 0.0 {
            planes.tri_tri_3d([q1, r1, p1], [p2, q2, r2], d2)
        } else {
            planes.tri_tri_3d([p1, q1, r1], [p2, r2, q2], swap)
        }
    } else if dq1 < 0.0 {
        if dr1 >= 0.0 {
            planes.tri_tri_3d([q1, r1, p1], [p2, r2, q2], swap)
        } else {
            planes.tri_tri_3d([p1, q1, r1], [p2, q2, r2], d2)
        }
    } else if dq1 > 0.0 {
        if dr1 > 0.0 {
            planes.tri_tri_3d([p1, q1, r1], [p2, r2, q2], swap)
        } else {
            planes.tri_tri_3d([q1, r1, p1], [p2, q2, r2], d2)
        }
    } else if dr1 > 0.0 {
        planes.tri_tri_3d([r1, p1, q1], [p2, q2, r2], d2)
    } else if dr1 < 0.0 {
        planes.tri_tri_3d([r1, p1, q1], [p2, r2, q2], swap)
    } else {
        coplanar_tri_tri([p1, q1, r1], [p2, q2, r2], &n1)
    }
}

struct Planes {
    n1: Vector3<Real>,
    n2: Vector3<Real>,
}

impl Planes {
    fn tri_tri_3d(&self, t1: [Point3<Real>; 3], t2: [Point3<Real>; 3], d: [Real; 3]) -> TriTriIntersection {
        let [p1, q1, r1] = t1;
        let [p2, q2, r2] = t2;
        let [dp2, dq2, dr2] = d;

        if dp2 > 0.0 {
            if dq2 > 0.0 {
                self.construct([p1, r1, q1], [r2, p2, q2])
            } else if dr2 > 0.0 {
                self.construct([p1, r1, q1], [q2, r2, p2])
            } else {
                self.construct([p1, q1, r1], [p2, q2, r2])
            }
        } else if dp2 < 0.0 {
            if dq2 < 0.0 {
                self.construct([p1, q1, r1], [r2, p2, q2])
            } else if dr2 < 0.0 {
                self.construct([p1, q1, r1], [q2, r2, p2])
            } else {
                self.construct([p1, r1, q1], [p2, q2, r2])
            }
        } else if dq2 < 0.0 {
            if dr2 >= 0.0 {
                self.construct([p1, r1, q1], [q2, r2, p2])
            } else {
                self.construct([p1, q1, r1], [p2, q2, r2])
            }
        } else if dq2 > 0.0 {
            if dr2 > 0.0 {
                self.construct([p1, r1, q1], [p2, q2, r2])
            } else {
                self.construct([p1, q1, r1], [q2, r2, p2])
            }
        } else if dr2 > 0.0 {
            self.construct([p1, q1, r1], [r2, p2, q2])
        } else if dr2 < 0.0 {
            self.construct([p1, r1, q1], [r2, p2, q2])
        } else {
            coplanar_tri_tri([p1, q1, r1], [p2, q2, r2], &self.n1)
        }
    }

    /// Checks the interval overlap on the intersection line and builds the segment.
    fn construct(&self, t1: [Point3<Real>; 3], t2: [Point3<Real>; 3]) -> TriTriIntersection {
        let [p1, q1, r1] = t1;
        let [p2, q2, r2] = t2;
        let (n1, n2) = (&self.n1, &self.n2);

        let v = p2 - p1;
        let mut v1 = q1 - p1;
        let mut v2 = r2 - p1;
        let mut n = v1.cross(&v2);

        let segment = if v.dot(&n) > 0.0 {
            v1 = r1 - p1;
            n = v1.cross(&v2);
            if v.dot(&n) > 0.0 {
                return TriTriIntersection::default();
            }
            v2 = q2 - p1;
            n = v1.cross(&v2);
            if v.dot(&n) > 0.0 {
                (lerp_on_plane(p1, r1, p2, n2), lerp_on_plane(p2, r2, p1, n1))
            } else {
                (lerp_on_plane(p2, q2, p1, n1), lerp_on_plane(p2, r2, p1, n1))
            }
        } else {
            v2 = q2 - p1;
            n = v1.cross(&v2);
            if v.dot(&n) < 0.0 {
                return TriTriIntersection::default();
            }
            v1 = r1 - p1;
            n = v1.cross(&v2);
            if v.dot(&n) >= 0.0 {
                (lerp_on_plane(p1, r1, p2, n2), lerp_on_plane(p1, q1, p2, n2))
            } else {
                (lerp_on_plane(p2, q2, p1, n1), lerp_on_plane(p1, q1, p2, n2))
            }
        };

        TriTriIntersection {
            intersects: true,
            coplanar: false,
            segment: Some(segment),
        }
    }
}

/// Point where edge `from → to` crosses the plane through `on_plane` with normal `normal`.
fn lerp_on_plane(
    from: Point3<Real>,
    to: Point3<Real>,
    on_plane: Point3<Real>,
    normal: &Vector3<Real>,
) -> Point3<Real> {
    let edge = from - to;
    let alpha = (from - on_plane).dot(normal) / edge.dot(normal);
    from - edge * alpha
}

fn coplanar_tri_tri(t1: [Point3<Real>; 3], t2: [Point3<Real>; 3], normal: &Vector3<Real>) -> TriTriIntersection {
    let [p1, q1, r1] = t1;
    let [p2, q2, r2] = t2;
    let n = normal.abs();

    // Project onto the axis plane maximising the area, keeping orientation.
    let (a, b) = if n.x > n.z && n.x >= n.y {
        (
            [yz(&q1), yz(&p1), yz(&r1)],
            [yz(&q2), yz(&p2), yz(&r2)],
        )
    } else if n.y > n.z && n.y >= n.x {
        (
            [xz(&q1), xz(&p1), xz(&r1)],
            [xz(&q2), xz(&p2), xz(&r2)],
        )
    } else {
        (
            [xy(&p1), xy(&q1), xy(&r1)],
            [xy(&p2), xy(&q2), xy(&r2)],
        )
    };

    TriTriIntersection {
        intersects: tri_tri_overlap_2d(a, b),
        coplanar: true,
        segment: None,
    }
}

fn yz(p: &Point3<Real>) -> Point2<Real> {
    Point2::new(p.z, p.y)
}

fn xz(p: &Point3<Real>) -> Point2<Real> {
    Point2::new(p.x, p.z)
}

fn xy(p: &Point3<Real>) -> Point2<Real> {
    Point2::new(p.x, p.y)
}

fn orient_2d(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Real {
    (a.x - c.x) * (b.y - c.y) - (a.y - c.y) * (b.x - c.x)
}

/// 2D overlap of two triangles of arbitrary orientation.
pub fn tri_tri_overlap_2d(t1: [Point2<Real>; 3], t2: [Point2<Real>; 3]) -> bool {
    let [p1, q1, r1] = t1;
    let [p2, q2, r2] = t2;
    let t1 = if orient_2d(&p1, &q1, &r1) < 0.0 {
        [p1, r1, q1]
    } else {
        [p1, q1, r1]
    };
    let t2 = if orient_2d(&p2, &q2, &r2) < 0.0 {
        [p2, r2, q2]
    } else {
        [p2, q2, r2]
    };
    ccw_tri_tri_intersection_2d(t1, t2)
}

fn ccw_tri_tri_intersection_2d(t1: [Point2<Real>; 3], t2: [Point2<Real>; 3]) -> bool {
    let [p1, _, _] = t1;
    let [p2, q2, r2] = t2;

    if orient_2d(&p2, &q2, &p1) >= 0.0 {
        if orient_2d(&q2, &r2, &p1) >= 0.0 {
            orient_2d(&r2, &p2, &p1) >= 0.0 || intersection_test_edge(t1, [p2, q2, r2])
        } else if orient_2d(&r2, &p2, &p1) >= 0.0 {
            intersection_test_edge(t1, [r2, p2, q2])
        } else {
            intersection_test_vertex(t1, [p2, q2, r2])
        }
    } else if orient_2d(&q2, &r2, &p1) >= 0.0 {
        if orient_2d(&r2, &p2, &p1) >= 0.0 {
            intersection_test_edge(t1, [q2, r2, p2])
        } else {
            intersection_test_vertex(t1, [q2, r2, p2])
        }
    } else {
        intersection_test_vertex(t1, [r2, p2, q2])
    }
}

fn intersection_test_vertex(t1: [Point2<Real>; 3], t2: [Point2<Real>; 3]) -> bool {
    let [p1, q1, r1] = t1;
    let [p2, q2, r2] = t2;

    if orient_2d(&r2, &p2, &q1) >= 0.0 {
        if orient_2d(&r2, &q2, &q1) <= 0.0 {
            if orient_2d(&p1, &p2, &q1) > 0.0 {
                orient_2d(&p1, &q2, &q1) <= 0.0
            } else {
                orient_2d(&p1, &p2, &r1) >= 0.0 && orient_2d(&q1, &r1, &p2) >= 0.0
            }
        } else {
            orient_2d(&p1, &q2, &q1) <= 0.0
                && orient_2d(&r2, &q2, &r1) <= 0.0
                && orient_2d(&q1, &r1, &q2) >= 0.0
        }
    } else if orient_2d(&r2, &p2, &r1) >= 0.0 {
        if orient_2d(&q1, &r1, &r2) >= 0.0 {
            orient_2d(&p1, &p2, &r1) >= 0.0
        } else {
            orient_2d(&q1, &r1, &q2) >= 0.0 && orient_2d(&r2, &r1, &q2) >= 0.0
        }
    } else {
        false
    }
}

fn intersection_test_edge(t1: [Point2<Real>; 3], t2: [Point2<Real>; 3]) -> bool {
    let [p1, q1, r1] = t1;
    let [p2, _, r2] = t2;

    if orient_2d(&r2, &p2, &q1) >= 0.0 {
        if orient_2d(&p1, &p2, &q1) >= 0.0 {
            orient_2d(&p1, &q1, &r2) >= 0.0
        } else {
            orient_2d(&q1, &r1, &p2) >= 0.0 && orient_2d(&r1, &p1, &p2) >= 0.0
        }
    } else if orient_2d(&r2, &p2, &r1) >= 0.0 {
        orient_2d(&p1, &p2, &r1) >= 0.0
            && (orient_2d(&p1, &r1, &r2) >= 0.0 || orient_2d(&q1, &r1, &r2) >= 0.0)
    } else {
        false
    }
}

/// True when any edge of `t1` properly crosses an edge of `t2`.
fn coplanar_edges_cross(t1: &Triangle, t2: &Triangle) -> bool {
    let a = t1.points();
    let b = t2.points();
    (0..3).any(|i| {
        (0..3).any(|j| segments_cross(&a[i], &a[(i + 1) % 3], &b[j], &b[(j + 1) % 3]))
    })
}

/// Segments `p1p2` and `q1q2` meet within [`EPSILON`] at a point interior to both.
pub fn segments_cross(
    p1: &Point3<Real>,
    p2: &Point3<Real>,
    q1: &Point3<Real>,
    q2: &Point3<Real>,
) -> bool {
    let (s, t, c1, c2) = closest_points_on_segments(p1, p2, q1, q2);
    (c1 - c2).norm() < EPSILON && s > 0.0 && s < 1.0 && t > 0.0 && t < 1.0
}

/// Closest points between two segments, with their parameters along each
/// (Ericson, *Real-Time Collision Detection*, 5.1.9).
fn closest_points_on_segments(
    p1: &Point3<Real>,
    q1: &Point3<Real>,
    p2: &Point3<Real>,
    q2: &Point3<Real>,
) -> (Real, Real, Point3<Real>, Point3<Real>) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= Real::EPSILON && e <= Real::EPSILON {
        (0.0, 0.0)
    } else if a <= Real::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= Real::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom != 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    (s, t, p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: [Real; 3], b: [Real; 3], c: [Real; 3]) -> Triangle {
        Triangle::new(
            Point3::new(a[0], a[1], a[2]),
            Point3::new(b[0], b[1], b[2]),
            Point3::new(c[0], c[1], c[2]),
        )
    }

    #[test]
    fn piercing_triangles_intersect_with_segment_on_both_planes() {
        let floor = tri([-1.0, -1.0, 0.0], [2.0, -1.0, 0.0], [-1.0, 2.0, 0.0]);
        let wall = tri([0.0, -0.5, -1.0], [0.0, 0.5, -1.0], [0.0, 0.0, 1.0]);

        let result = triangle_intersection(&floor, &wall);
        assert!(result.intersects);
        assert!(!result.coplanar);
        let (s, t) = result.segment.expect("segment");
        for p in [s, t] {
            assert!(p.x.abs() < 1e-12);
            assert!(p.z.abs() < 1e-12);
            assert!(p.y >= -0.5 - 1e-12 && p.y <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn separated_triangles_do_not_intersect() {
        let a = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let b = tri([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]);
        assert!(!triangles_intersect(&a, &b));
        assert!(!triangles_intersect(&b, &a));
    }

    #[test]
    fn plane_crossing_without_overlap_is_rejected() {
        // b crosses the plane of a, but far from a itself
        let a = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let b = tri([5.0, 5.0, -1.0], [6.0, 5.0, 1.0], [5.0, 6.0, 1.0]);
        assert!(!triangles_intersect(&a, &b));
        assert!(!triangles_intersect(&b, &a));
    }

    #[test]
    fn coplanar_overlap_is_detected() {
        let a = tri([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
        let b = tri([0.5, 0.5, 0.0], [3.0, 0.5, 0.0], [0.5, 3.0, 0.0]);
        let result = triangle_intersection(&a, &b);
        assert!(result.coplanar);
        assert!(result.intersects);
    }

    #[test]
    fn coplanar_disjoint_triangles_do_not_intersect() {
        let a = tri([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]);
        let b = tri([3.0, 3.0, 1.0], [4.0, 3.0, 1.0], [3.0, 4.0, 1.0]);
        let result = triangle_intersection(&a, &b);
        assert!(result.coplanar);
        assert!(!result.intersects);
        assert!(!triangles_intersect(&a, &b));
    }

    #[test]
    fn coplanar_in_side_planes_uses_matching_projection() {
        // triangles in the plane x = 2, overlapping
        let a = tri([2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [2.0, 0.0, 2.0]);
        let b = tri([2.0, 0.5, 0.5], [2.0, 3.0, 0.5], [2.0, 0.5, 3.0]);
        assert!(triangles_intersect(&a, &b));
        assert!(triangles_intersect(&b, &a));
    }

    #[test]
    fn result_is_symmetric() {
        let cases = [
            (
                tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
                tri([0.2, 0.2, -1.0], [0.2, 0.2, 1.0], [0.8, 0.1, 0.0]),
            ),
            (
                tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
                tri([2.0, 0.0, -1.0], [2.0, 0.0, 1.0], [3.0, 1.0, 0.0]),
            ),
            (
                tri([0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 4.0, 0.0]),
                tri([1.0, 1.0, 0.0], [1.5, 1.0, 0.0], [1.0, 1.5, 0.0]),
            ),
        ];
        for (a, b) in cases {
            assert_eq!(triangles_intersect(&a, &b), triangles_intersect(&b, &a));
        }
    }

    #[test]
    fn crossing_segments_are_detected() {
        let p1 = Point3::new(-1.0, 0.0, 0.0);
        let p2 = Point3::new(1.0, 0.0, 0.0);
        let q1 = Point3::new(0.0, -1.0, 0.0);
        let q2 = Point3::new(0.0, 1.0, 0.0);
        assert!(segments_cross(&p1, &p2, &q1, &q2));

        // touching at an endpoint is not a proper crossing
        let q3 = Point3::new(1.0, 0.0, 0.0);
        let q4 = Point3::new(1.0, 1.0, 0.0);
        assert!(!segments_cross(&p1, &p2, &q3, &q4));

        // skew lines
        let q5 = Point3::new(0.0, -1.0, 1.0);
        let q6 = Point3::new(0.0, 1.0, 1.0);
        assert!(!segments_cross(&p1, &p2, &q5, &q6));
    }
}
