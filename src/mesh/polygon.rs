//! Triangles with the classification state the boolean engine tracks per polygon.

use crate::float_types::Real;
use crate::geometry::triangle::Triangle;
use crate::mesh::plane::Plane;
use crate::mesh::vertex::Vertex;
use nalgebra::{Matrix4, Point3};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POLYGON_ID: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique, monotonically increasing polygon identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolygonId(u64);

impl PolygonId {
    fn next() -> Self {
        PolygonId(NEXT_POLYGON_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Classification of a polygon against the other operand of a boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonState {
    #[default]
    Undecided,
    Inside,
    Outside,
    CoplanarBack,
    CoplanarFront,
}

/// A triangle of a solid's boundary.
///
/// The plane and [`Triangle`] are derived from the vertices and kept in sync
/// by every method that moves them. The classification state only changes
/// through [`Polygon::set_state`], which records the history the deletion
/// rules inspect.
#[derive(Debug, Clone)]
pub struct Polygon {
    id: PolygonId,
    vertices: [Vertex; 3],
    plane: Plane,
    triangle: Triangle,
    /// Material group the polygon is rendered with.
    pub material: u32,

    state: PolygonState,
    previous_state: PolygonState,
    previous_states: Vec<PolygonState>,

    /// Overlaps the other operand's bounding box (and so needs splitting/classification).
    pub intersects: bool,
    /// Lies in the plane of a polygon of the other operand.
    pub coplanar: bool,
    /// Still part of the surface.
    pub valid: bool,
    /// Belongs to the surface as it was before the current operation began.
    pub original_valid: bool,
    /// Produced by splitting during the current operation.
    pub new_polygon: bool,
}

impl Polygon {
    /// Create a polygon with a fresh id and default (undecided, valid) state.
    pub fn new(vertices: [Vertex; 3], material: u32) -> Self {
        let plane = Plane::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos);
        let triangle = Triangle::new(vertices[0].pos, vertices[1].pos, vertices[2].pos);
        Polygon {
            id: PolygonId::next(),
            vertices,
            plane,
            triangle,
            material,
            state: PolygonState::Undecided,
            previous_state: PolygonState::Undecided,
            previous_states: Vec::new(),
            intersects: false,
            coplanar: false,
            valid: true,
            original_valid: false,
            new_polygon: false,
        }
    }

    /// Build from three positions; every vertex gets the face normal.
    pub fn from_points(a: Point3<Real>, b: Point3<Real>, c: Point3<Real>, material: u32) -> Self {
        let normal = Plane::from_points(&a, &b, &c).normal;
        Polygon::new(
            [
                Vertex::new(a, normal),
                Vertex::new(b, normal),
                Vertex::new(c, normal),
            ],
            material,
        )
    }

    pub const fn id(&self) -> PolygonId {
        self.id
    }

    pub const fn vertices(&self) -> &[Vertex; 3] {
        &self.vertices
    }

    pub const fn plane(&self) -> &Plane {
        &self.plane
    }

    pub const fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    /// Centroid of the triangle.
    pub fn midpoint(&self) -> Point3<Real> {
        self.triangle.midpoint()
    }

    /// Copy with a new id; classification state and flags are carried over.
    pub fn duplicate(&self) -> Self {
        Polygon {
            id: PolygonId::next(),
            ..self.clone()
        }
    }

    /// Replace the vertices, recomputing plane and triangle.
    pub fn set_vertices(&mut self, vertices: [Vertex; 3]) {
        self.vertices = vertices;
        self.refresh_geometry();
    }

    /// Reverse the winding: vertex order reversed, normals and plane negated.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
        let [a, b, c] = &self.vertices;
        self.triangle.set(a.pos, b.pos, c.pos);
    }

    /// Transform positions by `matrix` and normals by `normal_matrix`
    /// (the inverse transpose of `matrix`).
    pub fn transform(&mut self, matrix: &Matrix4<Real>, normal_matrix: &Matrix4<Real>) {
        for v in &mut self.vertices {
            v.transform(matrix, normal_matrix);
        }
        self.refresh_geometry();
    }

    fn refresh_geometry(&mut self) {
        let [a, b, c] = &self.vertices;
        self.plane = Plane::from_points(&a.pos, &b.pos, &c.pos);
        self.triangle.set(a.pos, b.pos, c.pos);
    }

    pub const fn state(&self) -> PolygonState {
        self.state
    }

    pub const fn previous_state(&self) -> PolygonState {
        self.previous_state
    }

    /// Every decided state this polygon held before the current one, oldest first.
    pub fn previous_states(&self) -> &[PolygonState] {
        &self.previous_states
    }

    /// Move to `state`, remembering the old state when it was decided.
    pub fn set_state(&mut self, state: PolygonState) {
        if self.state != PolygonState::Undecided {
            self.previous_states.push(self.state);
        }
        self.previous_state = self.state;
        self.state = state;
    }

    /// Current state, previous state (unless undecided) and the whole history all equal `state`.
    pub fn check_all_states(&self, state: PolygonState) -> bool {
        self.state == state
            && (self.previous_state == state || self.previous_state == PolygonState::Undecided)
            && self.previous_states.iter().all(|s| *s == state)
    }

    /// Clear the per-operation classification.
    ///
    /// `original_valid` survives unless `reset_original` is set.
    pub fn reset(&mut self, reset_original: bool) {
        self.intersects = false;
        self.coplanar = false;
        self.valid = true;
        self.new_polygon = false;
        self.state = PolygonState::Undecided;
        self.previous_state = PolygonState::Undecided;
        self.previous_states.clear();
        if reset_original {
            self.original_valid = false;
        }
    }

    /// Flag the polygon as part of the input surface of the next operation.
    pub fn mark_original(&mut self) {
        self.original_valid = true;
    }
}
