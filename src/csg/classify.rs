//! Splitting one operand along the other's surface and classifying the pieces.

use crate::errors::CsgError;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{EPSILON, PI, Real};
use crate::geometry::aabb::AabbExt;
use crate::geometry::ray::Ray;
use crate::mesh::plane::{Plane, PolygonSplit};
use crate::mesh::polygon::{Polygon, PolygonId, PolygonState};
use crate::octree::{NodeIndex, Octree};
use nalgebra::{Point3, Vector3};

/// Origins tried, in order, when a coplanar polygon's midpoint probe is inconclusive.
fn jitter_offsets() -> [Vector3<Real>; 6] {
    [
        Vector3::new(EPSILON, 0.0, 0.0),
        Vector3::new(-EPSILON, 0.0, 0.0),
        Vector3::new(0.0, EPSILON, 0.0),
        Vector3::new(0.0, -EPSILON, 0.0),
        Vector3::new(0.0, 0.0, EPSILON),
        Vector3::new(0.0, 0.0, -EPSILON),
    ]
}

/// Split and classify both operands against each other.
///
/// With `use_winding_number` each side is classified against a triangle
/// buffer of the other side captured before any splitting.
pub(crate) fn handle_intersecting_octrees(
    a: &mut Octree,
    b: &mut Octree,
    use_winding_number: bool,
) -> Result<(), CsgError> {
    let (a_buffer, b_buffer) = if use_winding_number {
        (Some(WindingBuffer::new(a)), Some(WindingBuffer::new(b)))
    } else {
        (None, None)
    };
    handle_intersecting_polygons(a, b, b_buffer.as_ref())?;
    handle_intersecting_polygons(b, a, a_buffer.as_ref())
}

/// Split every intersecting polygon of `current` by the planes of the
/// `target` triangles it actually crosses, then mark each intersecting
/// polygon inside or outside `target`.
pub(crate) fn handle_intersecting_polygons(
    current: &mut Octree,
    target: &Octree,
    winding: Option<&WindingBuffer>,
) -> Result<(), CsgError> {
    let Some(target_box) = target.bounding_box() else {
        return Ok(());
    };
    for node in 0..current.node_count() {
        split_node_polygons(current, target, node)?;
        classify_node_polygons(current, target, &target_box, node, winding)?;
    }
    Ok(())
}

fn split_node_polygons(current: &mut Octree, target: &Octree, node: NodeIndex) -> Result<(), CsgError> {
    let mut stack: Vec<PolygonId> = current
        .node_polygon_ids(node)
        .into_iter()
        .filter(|id| {
            current
                .polygon(*id)
                .is_some_and(|p| p.valid && p.intersects && p.state() == PolygonState::Undecided)
        })
        .collect();

    while let Some(id) = stack.pop() {
        let Some(polygon) = current.polygon(id) else {
            continue;
        };
        if !polygon.valid {
            continue;
        }
        let planes: Vec<Plane> = target
            .polygons_intersecting_polygon(polygon)?
            .into_iter()
            .map(|t| *t.plane())
            .collect();

        for plane in planes {
            let Some(polygon) = current.polygon(id) else {
                break;
            };
            match plane.split_polygon(polygon) {
                PolygonSplit::Fragments(pieces) => {
                    let intersects = polygon.intersects;
                    let fragments: Vec<Polygon> = pieces
                        .into_iter()
                        .map(|(mut fragment, _)| {
                            fragment.intersects = intersects;
                            fragment.new_polygon = true;
                            fragment
                        })
                        .collect();
                    stack.extend(fragments.iter().map(Polygon::id));
                    current.replace_polygon(id, fragments);
                    break;
                },
                PolygonSplit::Whole(kind) => {
                    if let (Some(state), Some(polygon)) = (kind.coplanar_state(), current.polygon_mut(id)) {
                        polygon.set_state(state);
                        polygon.coplanar = true;
                    }
                },
            }
        }
    }
    Ok(())
}

fn classify_node_polygons(
    current: &mut Octree,
    target: &Octree,
    target_box: &Aabb,
    node: NodeIndex,
    winding: Option<&WindingBuffer>,
) -> Result<(), CsgError> {
    for id in current.node_polygon_ids(node).into_iter().rev() {
        let Some(polygon) = current.polygon(id) else {
            continue;
        };
        if !(polygon.valid && polygon.intersects) {
            continue;
        }
        let state = if is_inside(polygon, target, target_box, winding)? {
            PolygonState::Inside
        } else {
            PolygonState::Outside
        };
        if let Some(polygon) = current.polygon_mut(id) {
            polygon.set_state(state);
        }
    }
    Ok(())
}

fn is_inside(
    polygon: &Polygon,
    target: &Octree,
    target_box: &Aabb,
    winding: Option<&WindingBuffer>,
) -> Result<bool, CsgError> {
    let midpoint = polygon.midpoint();
    if !target_box.contains_point(&midpoint) {
        return Ok(false);
    }
    if let Some(buffer) = winding {
        return Ok(buffer.contains(&midpoint, polygon.coplanar));
    }

    let direction = polygon.plane().normal;
    if probe(target, midpoint, direction)? {
        return Ok(true);
    }
    if polygon.coplanar {
        for offset in jitter_offsets() {
            if probe(target, midpoint + offset, direction)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// The nearest surface hit along `direction` faces the same way, so `origin` is behind it.
fn probe(target: &Octree, origin: Point3<Real>, direction: Vector3<Real>) -> Result<bool, CsgError> {
    let hit = target.closest_ray_intersection(&Ray::new(origin, direction))?;
    Ok(hit.is_some_and(|hit| direction.dot(&hit.normal) > 0.0))
}

/// Triangles of a closed surface for generalized winding-number queries.
#[derive(Debug, Clone)]
pub struct WindingBuffer {
    triangles: Vec<[Point3<Real>; 3]>,
}

impl WindingBuffer {
    /// Snapshot of the valid triangles of `octree`.
    pub fn new(octree: &Octree) -> Self {
        Self {
            triangles: octree.triangles(),
        }
    }

    /// Sum of the signed solid angles subtended at `point`, in whole turns.
    ///
    /// Each triangle contributes `2·atan2(a·(b×c), |a||b||c| + (a·b)|c| + (b·c)|a| + (c·a)|b|)`
    /// with `a`, `b`, `c` its corners relative to `point` (Van Oosterom–Strackee).
    pub fn winding_number(&self, point: &Point3<Real>) -> i64 {
        let total: Real = self
            .triangles
            .iter()
            .map(|[a, b, c]| {
                let (a, b, c) = (a - point, b - point, c - point);
                let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
                let numerator = a.dot(&b.cross(&c));
                let denominator =
                    la * lb * lc + a.dot(&b) * lc + b.dot(&c) * la + c.dot(&a) * lb;
                2.0 * numerator.atan2(denominator)
            })
            .sum();
        (total / (4.0 * PI)).round() as i64
    }

    /// Nonzero winding number at `point`, or at one of the jittered points when `coplanar`.
    pub fn contains(&self, point: &Point3<Real>, coplanar: bool) -> bool {
        if self.winding_number(point) != 0 {
            return true;
        }
        coplanar
            && jitter_offsets()
                .iter()
                .any(|offset| self.winding_number(&(point + offset)) != 0)
    }
}
